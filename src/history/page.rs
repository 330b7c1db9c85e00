//! The history page: totals, filters and the table of recorded transactions.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use time::UtcOffset;
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    Error, endpoints,
    history::{
        FilterQuery, HistoryFilter, HistoryRecord, HistoryState, HistoryTotals, compute_totals,
    },
    html::{
        BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency,
    },
    navigation::NavBar,
    reference::{FeeType, list_schools},
    workflow::TransactionKind,
};

/// The max number of graphemes of a name to show in the table before truncating.
const MAX_NAME_GRAPHEMES: usize = 32;

const HISTORY_CONTENT_ID: &str = "history-content";

fn format_name(name: &str) -> (String, Option<&str>) {
    if name.graphemes(true).count() <= MAX_NAME_GRAPHEMES {
        (name.to_owned(), None)
    } else {
        let truncated: String = name.graphemes(true).take(MAX_NAME_GRAPHEMES - 3).collect();
        (truncated + "...", Some(name))
    }
}

fn total_card(title: &str, amount: f64) -> Markup {
    html! {
        div class="p-4 bg-white rounded-lg shadow dark:bg-gray-800"
        {
            h3 class="text-sm font-medium text-gray-500 dark:text-gray-400" { (title) }
            p class="mt-1 text-2xl font-semibold tabular-nums" { (format_currency(amount)) }
        }
    }
}

/// A select with an "All" option followed by `options`.
fn filter_select<T: PartialEq + std::fmt::Display>(
    name: &str,
    label: &str,
    options: impl IntoIterator<Item = T>,
    selected: Option<T>,
) -> Markup {
    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            select name=(name) id=(name) class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="All" selected[selected.is_none()] { "All" }

                @for option in options {
                    @let is_selected = selected.as_ref() == Some(&option);
                    option value=(option) selected[is_selected] { (option) }
                }
            }
        }
    }
}

fn filter_form(filter: &HistoryFilter) -> Markup {
    let target = format!("#{HISTORY_CONTENT_ID}");

    html! {
        form
            hx-get=(endpoints::HISTORY_VIEW)
            hx-trigger="change"
            hx-target=(target)
            hx-select=(target)
            hx-swap="outerHTML"
            hx-push-url="true"
            class="grid w-full grid-cols-1 gap-4 md:grid-cols-5"
        {
            div
            {
                label for="start_date" class=(FORM_LABEL_STYLE) { "From" }
                input
                    type="date"
                    name="start_date"
                    id="start_date"
                    value=[filter.start_date]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="end_date" class=(FORM_LABEL_STYLE) { "To" }
                input
                    type="date"
                    name="end_date"
                    id="end_date"
                    value=[filter.end_date]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            (filter_select("school", "School", list_schools().iter().copied(), filter.school))
            (filter_select(
                "kind",
                "Type",
                [TransactionKind::Payment, TransactionKind::Purchase],
                filter.kind,
            ))
            (filter_select("fee_type", "Fee Type", FeeType::ALL, filter.fee_type))
        }
    }
}

fn history_table(records: &[HistoryRecord], local_offset: UtcOffset) -> Markup {
    html! {
        div class="w-full overflow-x-auto rounded-lg shadow"
        {
            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Name/Item" }
                        th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Amount" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category/Quantity" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Period" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                    }
                }

                tbody
                {
                    @for record in records {
                        @let (name, full_name) = format_name(&record.name);

                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE) { (record.kind) }
                            td class=(TABLE_CELL_STYLE) title=[full_name] { (name) }
                            td class={ (TABLE_CELL_STYLE) " text-right tabular-nums" }
                            {
                                (format_currency(record.amount))
                            }
                            td class=(TABLE_CELL_STYLE) { (record.category) }
                            td class=(TABLE_CELL_STYLE) { (record.period) }
                            td class=(TABLE_CELL_STYLE)
                            {
                                (record.created_at.to_offset(local_offset).date())
                            }
                        }
                    }

                    @if records.is_empty() {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td colspan="6" class={ (TABLE_CELL_STYLE) " text-center" }
                            {
                                "No transactions match these filters."
                            }
                        }
                    }
                }
            }
        }
    }
}

fn history_view(
    filter: &HistoryFilter,
    records: &[HistoryRecord],
    totals: HistoryTotals,
    local_offset: UtcOffset,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::HISTORY_VIEW).into_html();
    let csv_url = format!("{}?{}", endpoints::HISTORY_CSV, filter.to_query_string());

    let content = html! {
        (nav_bar)

        div class={ (PAGE_CONTAINER_STYLE) " max-w-screen-xl space-y-6" }
        {
            h1 class="self-start text-2xl font-bold" { "History" }

            (filter_form(filter))

            div id=(HISTORY_CONTENT_ID) class="w-full space-y-6"
            {
                div class="grid grid-cols-1 gap-4 md:grid-cols-2"
                {
                    (total_card("Total Payment Made", totals.payments))
                    (total_card("Total Items Purchased Cost", totals.purchases))
                }

                div class="flex justify-end"
                {
                    a id="download-csv" href=(csv_url) download class={ (BUTTON_SECONDARY_STYLE) " md:w-auto text-center" }
                    {
                        "Download CSV"
                    }
                }

                (history_table(records, local_offset))
            }
        }
    };

    base("History", &[], &content)
}

/// Renders the history matching the filters in the query string.
///
/// A failed query shows an empty history rather than an error page.
pub async fn get_history_page(
    State(state): State<HistoryState>,
    FilterQuery(filter): FilterQuery,
) -> Result<Response, Error> {
    let local_offset = state.local_offset()?;
    let records = state.records(&filter, local_offset);
    let totals = compute_totals(&records);

    Ok(history_view(&filter, &records, totals, local_offset).into_response())
}

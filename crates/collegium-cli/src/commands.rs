//! Headless commands: `search` and `rows`.
//!
//! Both drive the same [`GridSession`] the interactive grid uses, so the
//! simulated latency, last-row reporting and page growth behave exactly
//! as they do on screen.

use std::io::Write;

use anyhow::{Result, bail};
use collegium_core::config::GridConfig;
use collegium_core::{CollegiumConfig, CurrencyFormat, Record};
use collegium_grid::{
    Applied, DataSource, DelayedRowSource, GridSession, GridView, RecordSet, RowRange, SortSpec,
    SourceLocation,
};
use serde::Serialize;

use crate::cli::{RowsArgs, SearchArgs};
use crate::columns::Column;

// ============================================================================
// Shared setup
// ============================================================================

/// Load the full record set named by `config.data.source`.
pub async fn load(config: &CollegiumConfig) -> Result<RecordSet> {
    let location = SourceLocation::parse(&config.data.source);
    let source = DataSource::new(location, config.data.fetch_timeout());
    let records = source.load().await?;
    tracing::info!(count = records.len(), source = %source.location(), "Records loaded");
    Ok(records)
}

/// A session over `records` answered with the configured latency.
pub fn open_session(records: RecordSet, grid: &GridConfig) -> GridSession {
    GridSession::new(
        GridView::new(records, grid.page_size),
        DelayedRowSource::new(grid.latency()),
        grid.request_timeout(),
    )
}

// ============================================================================
// search
// ============================================================================

/// Result of `collegium search`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchReport {
    /// The query as typed.
    pub query: String,
    /// Sort applied, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
    /// Records in the full set.
    pub total: usize,
    /// Records matching the query.
    pub matched: usize,
    /// Pages revealed.
    pub pages: usize,
    /// Whether every match is revealed.
    pub complete: bool,
    /// The visible window.
    pub rows: Vec<Record>,
}

/// Filter, sort, and grow the window to `args.pages` pages.
///
/// Growth happens one block at a time through row requests, stopping early
/// once every match is revealed.
pub async fn search_window(
    records: RecordSet,
    grid: &GridConfig,
    args: &SearchArgs,
) -> Result<SearchReport> {
    let mut session = open_session(records, grid);
    session.set_query(args.query.clone().unwrap_or_default());
    session.set_sort(args.sort_spec());

    while session.view().pager().page() < args.pages.max(1) {
        if session.request_next_block()?.is_none() {
            break;
        }
        for applied in session.settle().await {
            if let Applied::Failed { ticket, error } = applied {
                bail!("row request {} failed: {error}", ticket.range);
            }
        }
    }

    let view = session.view();
    Ok(SearchReport {
        query: view.query().as_str().to_string(),
        sort: view.sort(),
        total: view.total(),
        matched: view.matched(),
        pages: view.pager().page(),
        complete: view.is_complete(),
        rows: view.visible().into_iter().cloned().collect(),
    })
}

/// Run `collegium search`.
pub async fn search(
    config: &CollegiumConfig,
    args: &SearchArgs,
    out: &mut impl Write,
) -> Result<()> {
    let records = load(config).await?;
    let report = search_window(records, &config.grid, args).await?;
    if args.json {
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
        return Ok(());
    }

    write_table(out, &report.rows, &config.display.currency_format())?;
    writeln!(
        out,
        "\n{} of {} matching ({} total){}",
        report.rows.len(),
        report.matched,
        report.total,
        if report.complete { "" } else { ", more available" }
    )?;
    Ok(())
}

// ============================================================================
// rows
// ============================================================================

/// Result of `collegium rows`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowsReport {
    /// The requested range.
    pub range: RowRange,
    /// Rows delivered.
    pub rows: Vec<Record>,
    /// Total row count, or `-1` while more rows exist.
    pub last_row: i64,
}

/// Issue one row request against the (optionally filtered) view.
pub async fn fetch_block(
    records: RecordSet,
    grid: &GridConfig,
    args: &RowsArgs,
) -> Result<RowsReport> {
    let range = RowRange::new(args.start, args.end)?;
    let mut session = open_session(records, grid);
    session.set_query(args.query.clone().unwrap_or_default());
    session.request_rows(range)?;

    match session.next_applied().await {
        Some(Applied::Rows { block, .. }) => Ok(RowsReport {
            range: block.range,
            last_row: block.last_row.as_sentinel(),
            rows: block.rows,
        }),
        Some(Applied::Failed { error, .. }) => bail!("row request {range} failed: {error}"),
        Some(Applied::Stale { .. }) | None => bail!("row request {range} was cancelled"),
    }
}

/// Run `collegium rows`.
pub async fn rows(config: &CollegiumConfig, args: &RowsArgs, out: &mut impl Write) -> Result<()> {
    let records = load(config).await?;
    let report = fetch_block(records, &config.grid, args).await?;
    if args.json {
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
        return Ok(());
    }

    write_table(out, &report.rows, &config.display.currency_format())?;
    writeln!(out, "\nrows {} lastRow {}", report.range, report.last_row)?;
    Ok(())
}

// ============================================================================
// Plain table output
// ============================================================================

/// Write `rows` as an aligned text table.
pub fn write_table(
    out: &mut impl Write,
    rows: &[Record],
    currency: &CurrencyFormat,
) -> Result<()> {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|record| Column::ALL.iter().map(|c| c.cell(record, currency)).collect())
        .collect();

    let widths: Vec<usize> = Column::ALL
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(column.header().chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = Column::ALL.iter().map(|c| c.header().to_string()).collect();
    write_row(out, &header, &widths)?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    write_row(out, &rule, &widths)?;
    for row in &cells {
        write_row(out, row, &widths)?;
    }
    Ok(())
}

fn write_row(out: &mut impl Write, cells: &[String], widths: &[usize]) -> Result<()> {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    writeln!(out, "{}", line.join("  ").trim_end())?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

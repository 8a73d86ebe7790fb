use super::renderer::{format_balance, format_elapsed, progress_line, short_address};
use crate::config::HarvestConfig;
use crate::harvest::{ProgressEvent, ProgressObserver, RunReport, Termination};
use crossterm::{
    cursor::MoveToColumn,
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};
use std::io::{self, Stdout, Write};
use std::path::Path;

const RULE: &str = "======================================================================";

/// Terminal observer: one progress line redrawn in place, then a summary block
pub struct ConsoleReporter<W: Write> {
    out: W,
    token_symbol: String,
    line_open: bool,
}

impl ConsoleReporter<Stdout> {
    pub fn stdout(token_symbol: &str) -> Self {
        Self::new(io::stdout(), token_symbol)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, token_symbol: &str) -> Self {
        Self {
            out,
            token_symbol: token_symbol.to_string(),
            line_open: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn print_banner(&mut self, config: &HarvestConfig, db_path: &Path) -> io::Result<()> {
        writeln!(self.out, "{}", RULE)?;
        writeln!(
            self.out,
            "🚀 Fetching {} token holders",
            config.token_symbol.to_uppercase()
        )?;
        writeln!(self.out, "📊 Token address: {}", config.token_address)?;
        writeln!(self.out, "🔗 Chain: {}", config.chain.to_uppercase())?;
        writeln!(self.out, "💾 Database file: {}", db_path.display())?;
        writeln!(
            self.out,
            "⚡ Request delay: {:?} (0 = full speed)",
            config.request_delay
        )?;
        writeln!(self.out, "{}", RULE)?;
        writeln!(self.out)?;
        self.out.flush()
    }

    /// Move past the in-place progress line before printing anything else
    fn end_line(&mut self) -> io::Result<()> {
        if self.line_open {
            writeln!(self.out)?;
            self.line_open = false;
        }
        Ok(())
    }

    fn print_summary(&mut self, report: &RunReport) -> io::Result<()> {
        match &report.termination {
            Termination::Done => writeln!(self.out, "✅ All holders fetched")?,
            Termination::Aborted(e) => writeln!(self.out, "❌ Request failed, stopping: {}", e)?,
            Termination::Interrupted => {
                writeln!(self.out, "⚠️  Interrupted, keeping what was already saved")?
            }
            Termination::Failed(e) => writeln!(self.out, "❌ Unexpected error: {}", e)?,
        }
        writeln!(self.out)?;
        writeln!(self.out, "{}", RULE)?;
        writeln!(self.out, "📊 Final statistics ({}):", report.termination.label())?;
        writeln!(self.out, "   ├─ Pages: {}", report.pages)?;
        writeln!(self.out, "   ├─ Fetched from API: {} records", report.total_fetched)?;

        match &report.stats {
            Some(stats) => {
                writeln!(self.out, "   ├─ Rows in database: {}", stats.total)?;
                writeln!(self.out, "   ├─ Non-contract addresses: {}", stats.non_contract)?;
                writeln!(self.out, "   ├─ Contract addresses: {} (filtered)", stats.contract)?;
                writeln!(
                    self.out,
                    "   ├─ Largest balance: {}",
                    format_balance(stats.max_balance, &self.token_symbol)
                )?;
            }
            None => writeln!(self.out, "   ├─ Database statistics unavailable")?,
        }

        writeln!(self.out, "   ├─ Elapsed: {}", format_elapsed(report.elapsed))?;
        writeln!(self.out, "   └─ Average speed: {:.2} pages/s", report.pages_per_sec())?;
        writeln!(self.out, "{}", RULE)?;

        if !report.top_holders.is_empty() {
            writeln!(self.out)?;
            writeln!(self.out, "🏆 Top holders:")?;
            for (rank, holder) in report.top_holders.iter().enumerate() {
                let label = holder
                    .owner_address_label
                    .as_deref()
                    .or(holder.entity.as_deref())
                    .unwrap_or("");
                writeln!(
                    self.out,
                    "   {:2}. {}  {} {}",
                    rank + 1,
                    short_address(&holder.owner_address),
                    holder.balance_formatted,
                    label
                )?;
            }
        }

        if let Some(path) = &report.db_path {
            writeln!(self.out)?;
            writeln!(self.out, "✅ Data saved to: {}", path.display())?;
            writeln!(self.out, "💡 Query example:")?;
            writeln!(self.out, "   sqlite3 {}", path.display())?;
            writeln!(
                self.out,
                "   SELECT * FROM token_holders WHERE is_contract=0 ORDER BY CAST(balance_formatted AS REAL) DESC LIMIT 10;"
            )?;
        }

        self.out.flush()
    }
}

impl<W: Write> ProgressObserver for ConsoleReporter<W> {
    fn on_page(&mut self, event: &ProgressEvent) -> io::Result<()> {
        queue!(
            self.out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(progress_line(event))
        )?;
        self.line_open = true;
        self.out.flush()
    }

    fn on_total_supply(&mut self, total_supply: &str) -> io::Result<()> {
        self.end_line()?;
        writeln!(self.out, "   💰 Total supply: {}", total_supply)?;
        self.out.flush()
    }

    fn on_finish(&mut self, report: &RunReport) -> io::Result<()> {
        self.end_line()?;
        self.print_summary(report)
    }
}

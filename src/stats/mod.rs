//! Page statistics
//!
//! This module queries the counts endpoint for the six counters describing an
//! article (edits, editors, bots, minor, reverted, anonymous) and prints them.

mod counters;

pub use counters::{CounterKind, CounterResult, PageStatistics, StatisticsFetcher};

/// Prints statistics to stdout in a formatted manner
///
/// Counters that hit their cap are shown with a `+` suffix.
pub fn print_statistics(stats: &PageStatistics) {
    println!("=== Page Statistics ===\n");

    println!("Overview:");
    println!("  Total edits: {}", format_count(&stats.edits));
    println!("  Total users: {}", stats.total_users());
    println!();

    println!("Counters:");
    for kind in CounterKind::ALL {
        println!("  {:<10} {}", kind.as_str(), format_count(stats.get(kind)));
    }

    if stats.any_limited() {
        println!("\n(+) the API stops counting at a fixed cap; the true value may be higher");
    }
}

fn format_count(result: &CounterResult) -> String {
    if result.limited {
        format!("{}+", result.count)
    } else {
        result.count.to_string()
    }
}

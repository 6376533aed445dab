use std::fmt::Display;

use ansi_term::Colour;
use anyhow::Result;
use chrono::{DateTime, Duration, Local, Utc};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, ValueEnum};
use now::DateTimeNow;

use crate::{
    cli::output::{summarize, DashboardSummary},
    config::Config,
    daemon::storage::entry_storage::EntryStorageImpl,
    utils::{
        dir::create_application_default_path,
        percentage::{ms_percentage, Percentage},
        time::next_day_start,
    },
};

use super::Args;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct DashboardCommand {
    #[arg(long, help = "User whose activity to aggregate. Defaults to the configured user")]
    user: Option<String>,
    #[arg(
        long = "start",
        short,
        help = "Start of the window. Examples are \"yesterday\", \"3 days ago\", \"15/03/2025\", \"12:00 16/03/2025\""
    )]
    start_date: Option<String>,
    #[arg(
        long = "end",
        short,
        help = "End of the window. Defaults to now. Examples are \"yesterday\", \"1 hour ago\", \"15/03/2025\""
    )]
    end_date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(
        long = "days",
        help = "Length of the trailing window when no start is given. Defaults to the configured window"
    )]
    days: Option<i64>,
    #[arg(
        long = "whole-days",
        default_value_t = false,
        help = "Align the window to whole days. For example with --days 1 this covers all of today"
    )]
    whole_days: bool,
    #[arg(short = 'p', long = "percentage", help = "Hide breakdown rows below this share of total time", default_value_t = Percentage::new_opt(0.).unwrap())]
    min_percentage: Percentage,
    #[arg(long, help = "Print the summary as json")]
    json: bool,
}

/// Command to process `dashboard`. Aggregates the stored time entries for one
/// user over a window into category totals and a per-domain breakdown.
pub async fn process_dashboard_command(
    DashboardCommand {
        user,
        start_date,
        end_date,
        date_style,
        days,
        whole_days,
        min_percentage,
        json,
    }: DashboardCommand,
) -> Result<()> {
    let application_dir = create_application_default_path()?;
    let config = Config::load(&application_dir)?;

    let window_days = days.unwrap_or(config.dashboard_window_days);
    let (start, end) = match parse_window(start_date, end_date, date_style, window_days, whole_days)
    {
        Ok(value) => value,
        Err(value) => return Err(value),
    };

    let storage = EntryStorageImpl::new(application_dir.join("entries"))?;
    let sets = config.classification_sets();
    let user = user.unwrap_or(config.user_id);

    let summary = summarize(&storage, &sets, &user, start, end).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary, min_percentage);
    }
    Ok(())
}

/// Also provides sensible defaults: a trailing window of `window_days` ending
/// now.
fn parse_window(
    start_date: Option<String>,
    end_date: Option<String>,
    date_style: DateStyle,
    window_days: i64,
    whole_days: bool,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let now = Local::now();
    let dialect: chrono_english::Dialect = date_style.into();

    let mut end = match end_date.map(|s| parse_date_string(&s, now, dialect)) {
        Some(Ok(v)) => v.with_timezone(&Local),
        Some(Err(e)) => {
            return Err(Args::command()
                .error(
                    clap::error::ErrorKind::ValueValidation,
                    format!("Failed to validate end date {e}"),
                )
                .into());
        }
        None => now,
    };
    let mut start = match start_date.map(|s| parse_date_string(&s, now, dialect)) {
        Some(Ok(v)) => v.with_timezone(&Local),
        Some(Err(e)) => {
            return Err(Args::command()
                .error(
                    clap::error::ErrorKind::ValueValidation,
                    format!("Failed to validate start date {e}"),
                )
                .into());
        }
        None => end - Duration::days(window_days),
    };
    if whole_days {
        start = start.beginning_of_day();
        end = next_day_start(end);
    }

    Ok((start.with_timezone(&Utc), end.with_timezone(&Utc)))
}

fn print_summary(summary: &DashboardSummary, min_percentage: Percentage) {
    let categories = [
        (Colour::Green.paint("productive"), summary.productive_time),
        (Colour::Red.paint("unproductive"), summary.unproductive_time),
        (Colour::White.paint("neutral"), summary.neutral_time),
    ];
    for (label, time) in categories {
        println!(
            "{}\t{}%\t{}",
            label,
            *ms_percentage(time, summary.total_time) as i32,
            format_duration(time),
        );
    }
    println!("total\t\t{}", format_duration(summary.total_time));

    if summary.breakdown.is_empty() {
        return;
    }
    println!();
    for usage in &summary.breakdown {
        let share = ms_percentage(usage.total_time, summary.total_time);
        if share < min_percentage {
            continue;
        }
        println!(
            "{}%\t{}\t{}",
            *share as i32,
            format_duration(usage.total_time),
            usage.domain
        );
    }
}

fn format_duration(ms: u64) -> String {
    let v = Duration::milliseconds(ms as i64);
    if v.num_hours() > 0 {
        format!(
            "{}h{}m{}s",
            v.num_hours(),
            v.num_minutes() % 60,
            v.num_seconds() % 60
        )
    } else if v.num_minutes() > 0 {
        format!("{}m{}s", v.num_minutes() % 60, v.num_seconds() % 60)
    } else {
        format!("{}s", v.num_seconds() % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::format_duration;

    #[test]
    fn durations_use_the_largest_fitting_unit() {
        assert_eq!(format_duration(5_000), "5s");
        assert_eq!(format_duration(65_000), "1m5s");
        assert_eq!(format_duration(3_725_000), "1h2m5s");
    }
}

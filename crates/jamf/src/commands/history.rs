use chrono::{DateTime, Utc};
use tabled::Tabled;

use jamf_core::mixins::{HasManagementHistory, HistoryStatus, MdmCommandRecord};
use jamf_core::{Computer, Jss, MobileDevice};

use crate::cli::{GlobalOpts, HistoryArgs, HistoryCommand, StatusFilter};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Command")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Issued")]
    issued: String,
    #[tabled(rename = "Finished")]
    finished: String,
    #[tabled(rename = "Error")]
    error: String,
}

fn fmt_time(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".into())
}

impl From<&MdmCommandRecord> for HistoryRow {
    fn from(c: &MdmCommandRecord) -> Self {
        Self {
            name: c.name.clone(),
            status: c.status.to_string(),
            issued: fmt_time(c.issued.or(c.last_push)),
            finished: fmt_time(c.completed.or(c.failed)),
            error: c.error.clone().unwrap_or_default(),
        }
    }
}

fn status_of(filter: StatusFilter) -> HistoryStatus {
    match filter {
        StatusFilter::Completed => HistoryStatus::Completed,
        StatusFilter::Pending => HistoryStatus::Pending,
        StatusFilter::Failed => HistoryStatus::Failed,
    }
}

pub async fn handle(jss: &Jss, args: HistoryArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        HistoryCommand::Computer { ident, status } => {
            show::<Computer>(jss, &ident, status, global).await
        }
        HistoryCommand::Mobile { ident, status } => {
            show::<MobileDevice>(jss, &ident, status, global).await
        }
    }
}

async fn show<T: HasManagementHistory>(
    jss: &Jss,
    ident: &str,
    status: Option<StatusFilter>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let history = jss.management_history::<T>(ident).await?;
    let mut commands: Vec<&MdmCommandRecord> = match status.map(status_of) {
        Some(s) => history.commands_with_status(s).collect(),
        None => history.commands.iter().collect(),
    };
    // Newest first; undated pending commands sink to the end.
    commands.sort_by_key(|c| std::cmp::Reverse(c.completed.or(c.failed).or(c.issued)));

    let out = output::render_list(
        &global.output,
        &commands,
        |c| HistoryRow::from(*c),
        |c| c.name.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn row_prefers_completion_time() {
        let record = MdmCommandRecord {
            name: "DeviceLock".into(),
            status: HistoryStatus::Completed,
            issued: Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()),
            last_push: None,
            completed: Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 0).unwrap()),
            failed: None,
            error: None,
        };
        let row = HistoryRow::from(&record);
        assert_eq!(row.status, "completed");
        assert_eq!(row.issued, "2024-03-01 09:00");
        assert_eq!(row.finished, "2024-03-01 09:05");
        assert_eq!(row.error, "");
    }

    #[test]
    fn missing_times_render_as_dash() {
        assert_eq!(fmt_time(None), "-");
    }
}

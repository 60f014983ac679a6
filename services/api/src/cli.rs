use crate::demo::{run_cross_subject, run_demo, run_report, CrossSubjectArgs, DemoArgs, ReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use competency_insights::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Competency Insights",
    about = "Serve and print competency analytics for inspection dashboards",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the insights report of one subject over a dataset
    Report(ReportArgs),
    /// Pair two subjects for the same students and report their correlation
    CrossSubject(CrossSubjectArgs),
    /// Print reports for the bundled sample dataset
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Report(args) => run_report(args),
        Command::CrossSubject(args) => run_cross_subject(args),
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["competency-insights-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn report_filters_parse_into_arguments() {
        let cli = Cli::try_parse_from([
            "competency-insights-api",
            "report",
            "--records",
            "grades.csv",
            "--subject",
            "math",
            "--school",
            "Al Farabi",
            "--class",
            "3A",
            "--json",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Report(args)) => {
                assert_eq!(args.subject, "math");
                assert_eq!(args.filters.school.as_deref(), Some("Al Farabi"));
                assert_eq!(args.filters.class_name.as_deref(), Some("3A"));
                assert!(args.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cross_subject_takes_a_level_per_subject() {
        let cli = Cli::try_parse_from([
            "competency-insights-api",
            "cross-subject",
            "--records",
            "grades.csv",
            "--first",
            "arabic",
            "--first-level",
            "3",
            "--second",
            "math",
            "--second-level",
            "4",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::CrossSubject(args)) => {
                assert_eq!(args.first_level.as_deref(), Some("3"));
                assert_eq!(args.second_level.as_deref(), Some("4"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cross_subject_requires_both_subjects() {
        let result = Cli::try_parse_from([
            "competency-insights-api",
            "cross-subject",
            "--records",
            "grades.csv",
            "--first",
            "arabic",
        ]);
        assert!(result.is_err());
    }
}

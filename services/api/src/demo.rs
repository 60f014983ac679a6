use crate::infra::{load_catalog, load_records, sample_records};
use chrono::Local;
use clap::Args;
use competency_insights::analytics::domain::{ClassRecord, Grade};
use competency_insights::analytics::{ProfileCatalog, Scope};
use competency_insights::error::AppError;
use competency_insights::narrative::NarrativeService;
use competency_insights::report::{CrossSubjectReport, InsightsReport};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct ScopeFilters {
    /// Restrict the report to one school
    #[arg(long)]
    pub(crate) school: Option<String>,
    /// Restrict the report to one class of the school (requires --school)
    #[arg(long = "class", requires = "school")]
    pub(crate) class_name: Option<String>,
}

impl ScopeFilters {
    fn scope(self) -> Scope {
        Scope::from_filters(self.school, self.class_name)
    }
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Grade export to analyse (.csv or .json)
    #[arg(long)]
    pub(crate) records: PathBuf,
    /// Subject identifier, e.g. `arabic` or `math`
    #[arg(long)]
    pub(crate) subject: String,
    /// Grade level of the subject profile (defaults to the first registered)
    #[arg(long)]
    pub(crate) level: Option<String>,
    #[command(flatten)]
    pub(crate) filters: ScopeFilters,
    /// Directory of additional JSON subject profiles
    #[arg(long)]
    pub(crate) profiles: Option<PathBuf>,
    /// Print the report as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct CrossSubjectArgs {
    /// Grade export to analyse (.csv or .json)
    #[arg(long)]
    pub(crate) records: PathBuf,
    /// Subject plotted on the x axis
    #[arg(long)]
    pub(crate) first: String,
    /// Subject plotted on the y axis
    #[arg(long)]
    pub(crate) second: String,
    /// Grade level of the first subject's profile
    #[arg(long)]
    pub(crate) first_level: Option<String>,
    /// Grade level of the second subject's profile
    #[arg(long)]
    pub(crate) second_level: Option<String>,
    #[command(flatten)]
    pub(crate) filters: ScopeFilters,
    #[arg(long)]
    pub(crate) profiles: Option<PathBuf>,
    /// Include every linked student in the output
    #[arg(long)]
    pub(crate) pairs: bool,
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Only print the report for this subject
    #[arg(long)]
    pub(crate) subject: Option<String>,
    #[command(flatten)]
    pub(crate) filters: ScopeFilters,
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let ReportArgs {
        records,
        subject,
        level,
        filters,
        profiles,
        json,
    } = args;

    let catalog = load_catalog(profiles.as_deref())?;
    let profile = catalog.get(&subject, level.as_deref())?;
    let records = load_records(Some(records.as_path()))?;
    let report = InsightsReport::build(
        &records,
        &profile,
        &filters.scope(),
        &NarrativeService::generated(),
    )?;

    if json {
        print_json(&report)
    } else {
        render_report(&report);
        Ok(())
    }
}

pub(crate) fn run_cross_subject(args: CrossSubjectArgs) -> Result<(), AppError> {
    let CrossSubjectArgs {
        records,
        first,
        second,
        first_level,
        second_level,
        filters,
        profiles,
        pairs,
        json,
    } = args;

    let catalog = load_catalog(profiles.as_deref())?;
    let first = catalog.get(&first, first_level.as_deref())?;
    let second = catalog.get(&second, second_level.as_deref())?;
    let records = load_records(Some(records.as_path()))?;
    let report = CrossSubjectReport::build(
        &records,
        &filters.scope(),
        &first,
        &second,
        &NarrativeService::generated(),
        pairs,
    );

    if json {
        print_json(&report)
    } else {
        render_cross_subject(&report);
        Ok(())
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { subject, filters } = args;
    let scope = filters.scope();
    let catalog = ProfileCatalog::standard()?;
    let records = sample_records()?;
    let narratives = NarrativeService::generated();

    println!("Competency insights demo");
    println!(
        "Generated {} from {} sample class records",
        Local::now().format("%Y-%m-%d %H:%M"),
        records.len()
    );
    summarize_dataset(&records);

    let profiles: Vec<_> = match subject {
        Some(subject) => vec![catalog.get(&subject, None)?],
        None => catalog.profiles().cloned().collect(),
    };
    for profile in &profiles {
        let report = InsightsReport::build(&records, profile, &scope, &narratives)?;
        println!();
        render_report(&report);
    }

    if let [first, second, ..] = profiles.as_slice() {
        let cross = CrossSubjectReport::build(&records, &scope, first, second, &narratives, false);
        println!();
        render_cross_subject(&cross);
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{rendered}");
    Ok(())
}

fn summarize_dataset(records: &[ClassRecord]) {
    let mut schools: Vec<&str> = records.iter().map(|record| record.school.as_str()).collect();
    schools.sort_unstable();
    schools.dedup();
    println!("Schools: {}", schools.join(", "));
}

fn render_report(report: &InsightsReport) {
    println!(
        "{} (level {}) | {}",
        report.subject, report.level, report.scope_label
    );
    println!(
        "- {} students across {} classes",
        report.students, report.classes
    );
    println!(
        "- Mastery {:.1}% ({}) | {} / {} points",
        report.overall.mastery_pct,
        report.overall.level_label,
        report.overall.points,
        report.overall.max_points
    );

    let distribution = &report.distribution;
    let shares: Vec<String> = Grade::ordered()
        .into_iter()
        .map(|grade| {
            format!(
                "{} {} ({:.1}%)",
                grade,
                distribution.count(grade),
                distribution.share(grade)
            )
        })
        .collect();
    println!(
        "- Grades: {} | {} graded criteria",
        shares.join(" | "),
        distribution.total
    );
    println!(
        "- Mean {:.1}% | std dev {:.1} ({})",
        report.dispersion.mean_pct,
        report.dispersion.std_dev,
        report.dispersion.band.label()
    );

    println!("Competencies:");
    for competency in &report.competencies {
        println!(
            "  - {}: {:.1}% ({})",
            competency.label,
            competency.mastery_pct,
            competency.level.label()
        );
    }

    if let Some(gap) = &report.axis_gap {
        println!(
            "Axis gap: {} {:.1}% vs {} {:.1}% ({:+.1})",
            gap.x_label, gap.x_pct, gap.y_label, gap.y_pct, gap.gap
        );
    }
    if let Some(quadrant) = &report.quadrant {
        println!("Quadrant ({} / {}):", quadrant.x_label, quadrant.y_label);
        for cell in &quadrant.cells {
            println!(
                "  - {}: {} students ({:.1}%)",
                cell.label, cell.count, cell.share
            );
        }
    }

    if !report.funnel.is_empty() {
        println!("Skill funnel:");
        for step in &report.funnel {
            match step.retention_from_previous {
                Some(retention) => println!(
                    "  - {}: {} ({:.1}%) | {:.1}% of previous gate",
                    step.label, step.count, step.percentage, retention
                ),
                None => println!(
                    "  - {}: {} ({:.1}%)",
                    step.label, step.count, step.percentage
                ),
            }
        }
    }

    if !report.radar.is_empty() {
        let points: Vec<String> = report
            .radar
            .iter()
            .map(|point| format!("{} {:.1}%", point.label, point.percentage))
            .collect();
        println!("Radar: {}", points.join(" | "));
    }

    if !report.unknown_competencies.is_empty() {
        println!(
            "Ignored competencies: {}",
            report.unknown_competencies.join(", ")
        );
    }

    println!("Narratives:");
    for entry in &report.narratives {
        println!("  [{}]", entry.context_label);
        println!("    {}", entry.narrative.reading);
        println!("    {}", entry.narrative.diagnosis);
        println!("    -> {}", entry.narrative.recommendation);
    }
}

fn render_cross_subject(report: &CrossSubjectReport) {
    println!(
        "{} x {} | {}",
        report.first_subject, report.second_subject, report.scope_label
    );
    println!(
        "- {} linked students | {} without a {} record",
        report.linked, report.unmatched, report.second_subject
    );
    println!(
        "- Means {:.1}% / {:.1}% | correlation {:.2}",
        report.first_mean_pct, report.second_mean_pct, report.correlation
    );
    for cell in &report.quadrant.cells {
        println!("  - {}: {} students", cell.label, cell.count);
    }
    if let Some(pairs) = &report.pairs {
        for pair in pairs {
            println!(
                "  * {} ({} {}): {:.1}% / {:.1}%",
                pair.key.full_name, pair.key.school, pair.key.class_name, pair.x_pct, pair.y_pct
            );
        }
    }
    println!("  {}", report.narrative.narrative.reading);
    println!("  {}", report.narrative.narrative.diagnosis);
    println!("  -> {}", report.narrative.narrative.recommendation);
}

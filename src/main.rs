use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use titleblock_pdf::{Field, FieldValues, Placement, StampStyle};

#[derive(Parser, Debug)]
#[command(name = "titleblock", version, about = "Stamp a title block onto every page of a PDF")]
struct Cli {
    /// PDF to stamp
    input: PathBuf,
    /// Output path (defaults to <input>_stamped.pdf)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Company logo (PNG or JPEG)
    #[arg(long)]
    logo: PathBuf,
    /// Signature for the SUBMITTED BY row (PNG or JPEG)
    #[arg(long)]
    signature: PathBuf,
    /// top-left, top-right, bottom-left, bottom-right (or corner), footer
    #[arg(long, default_value_t = Placement::BottomRight)]
    placement: Placement,
    /// Fixed-height project row instead of one row per wrapped line
    #[arg(long, default_value_t = false)]
    fixed_project_row: bool,
    #[arg(long, default_value = "")]
    drno: String,
    #[arg(long, default_value = "")]
    title: String,
    #[arg(long, default_value = "")]
    client: String,
    #[arg(long, default_value = "")]
    project: String,
    #[arg(long, default_value = "")]
    workorder: String,
    #[arg(long, default_value = "")]
    contractor: String,
    #[arg(long, default_value = "")]
    consultant: String,
    #[arg(long, default_value = "")]
    submitted: String,
    #[arg(long, default_value = "")]
    checked: String,
    #[arg(long, default_value = "")]
    approved: String,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn field_values(&self) -> FieldValues {
        FieldValues::new()
            .with(Field::DrawingNumber, &self.drno)
            .with(Field::Title, &self.title)
            .with(Field::Client, &self.client)
            .with(Field::Project, &self.project)
            .with(Field::WorkOrder, &self.workorder)
            .with(Field::Contractor, &self.contractor)
            .with(Field::Consultant, &self.consultant)
            .with(Field::Submitted, &self.submitted)
            .with(Field::Checked, &self.checked)
            .with(Field::Approved, &self.approved)
    }

    fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let stem = self
                .input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "output".to_string());
            self.input.with_file_name(format!("{stem}_stamped.pdf"))
        })
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let style = if cli.fixed_project_row {
        StampStyle::default().with_fixed_project_row()
    } else {
        StampStyle::default()
    };
    let output = cli.output_path();

    match titleblock_pdf::stamp_pdf(
        &cli.input,
        &cli.logo,
        &cli.signature,
        &output,
        &cli.field_values(),
        cli.placement,
        &style,
    ) {
        Ok(()) => {
            println!("Stamped {} -> {}", cli.input.display(), output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

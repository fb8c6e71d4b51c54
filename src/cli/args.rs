use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "sqs-cram",
    about = "Sequencing quality summary for CRAM files",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Cli {
    /// CRAM file, CRAM file prefix, or directory of CRAM files.
    #[arg(allow_hyphen_values = true)]
    pub input: String,
}

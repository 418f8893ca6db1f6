//! Command line front end: convert every ROI file of a directory.

use clap::Parser;
use log::error;
use std::path::PathBuf;
use std::process;

use roicifti::{batch, Config};

/// Convert GIFTI ROI masks (.func.gii) into dense scalar CIFTI-2 files
/// aligned to a template, then densify them with wb_command.
#[derive(Parser, Debug)]
#[command(author, about, version, long_about = None)]
struct Args {
    /// Reference dense CIFTI-2 template (.dscalar.nii)
    #[arg(short, long)]
    template: PathBuf,

    /// Directory holding the .func.gii files
    #[arg(short, long, default_value = ".")]
    input_dir: PathBuf,

    /// Directory receiving the converted files, created if missing
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Path to the Connectome Workbench executable
    #[arg(short, long = "wb-command", env = "WB_COMMAND")]
    wb_command: PathBuf,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = Config::new(args.template, args.wb_command)
        .input_dir(args.input_dir)
        .output_dir(args.output_dir);

    if let Err(e) = batch::run(&config) {
        error!("{}", e);
        process::exit(1);
    }
}

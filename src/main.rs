use clap::Parser;
use log::{info, LevelFilter};
use snafu::ErrorCompat;

mod args;
mod marker;

use crate::args::Args;
use crate::marker::config_reader::AnswerSource;

fn main() {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }
    info!("args: {:?}", args);

    let input = args.input.as_deref().map(|p| {
        AnswerSource::from_input(
            p,
            args.input_type.clone(),
            args.excel_worksheet_name.clone(),
        )
    });

    let res = marker::run_marking(args.config, input, args.out, args.reference);

    if let Err(e) = res {
        eprintln!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}

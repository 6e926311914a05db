//! # wallfind CLI
//!
//! Command-line front end for the wallpaper finder.
//!
//! ## Usage
//! ```bash
//! wallfind index ~/Pictures/Wallpapers
//! wallfind match --reference ~/current.jpg --output json
//! wallfind match --watch --interval 10
//! ```

mod cli;

use std::process::ExitCode;

fn main() -> ExitCode {
    cli::run()
}

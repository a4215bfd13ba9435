// Man pages and shell completions for `jamf`, written to OUT_DIR.
//
// cli.rs only needs clap and clap_complete, both build-dependencies.

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::Shell;

#[path = "src/cli.rs"]
#[allow(dead_code)]
mod cli;

fn main() -> io::Result<()> {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let Some(out_dir) = std::env::var_os("OUT_DIR") else {
        return Err(io::Error::other("OUT_DIR not set by Cargo"));
    };
    let out_dir = Path::new(&out_dir);

    let mut cmd = cli::Cli::command();
    cmd.build();

    let man_dir = out_dir.join("man");
    std::fs::create_dir_all(&man_dir)?;
    clap_mangen::generate_to(cmd.clone(), &man_dir)?;

    let completion_dir = out_dir.join("completions");
    std::fs::create_dir_all(&completion_dir)?;
    for shell in [Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell] {
        clap_complete::generate_to(shell, &mut cmd, "jamf", &completion_dir)?;
    }
    Ok(())
}

// Packaging assets for `vigil`: man pages for every visible subcommand and
// completion scripts for each shell `vigil completions` supports.
//
// Layout under OUT_DIR:
//   vigil/man/vigil.1, vigil/man/vigil-zones.1, ...
//   vigil/completions/vigil.bash, _vigil, vigil.fish, ...

use std::io;
use std::path::{Path, PathBuf};

use clap::{Command, CommandFactory, ValueEnum};
use clap_complete::Shell;

#[path = "src/cli.rs"]
mod cli;

fn main() -> io::Result<()> {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let Some(out_dir) = std::env::var_os("OUT_DIR").map(PathBuf::from) else {
        return Err(io::Error::other("OUT_DIR not set"));
    };
    let root = out_dir.join("vigil");
    let man_dir = root.join("man");
    let completion_dir = root.join("completions");
    std::fs::create_dir_all(&man_dir)?;
    std::fs::create_dir_all(&completion_dir)?;

    let mut cmd = cli::Cli::command();
    write_man_pages(&cmd, &man_dir)?;

    for shell in Shell::value_variants() {
        clap_complete::generate_to(*shell, &mut cmd, "vigil", &completion_dir)?;
    }
    Ok(())
}

/// `vigil.1` plus `vigil-<sub>.1` for each visible subcommand, recursively.
fn write_man_pages(cmd: &Command, dir: &Path) -> io::Result<()> {
    let name = cmd.get_name().to_owned();
    let mut page = Vec::new();
    clap_mangen::Man::new(cmd.clone()).render(&mut page)?;
    std::fs::write(dir.join(format!("{name}.1")), page)?;

    for sub in cmd.get_subcommands().filter(|s| !s.is_hide_set()) {
        let qualified = sub.clone().name(format!("{name}-{}", sub.get_name()));
        write_man_pages(&qualified, dir)?;
    }
    Ok(())
}

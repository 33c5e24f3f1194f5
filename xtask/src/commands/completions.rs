use std::fs;
use std::path::PathBuf;

use clap::Args;
use clap_complete::{Shell, generate, generate_to};

const BIN_NAME: &str = "relbump";

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Output directory (default: dist/share/completions)
    #[arg(long = "out-dir", default_value = "dist/share/completions")]
    pub out_dir: PathBuf,

    /// Generate only for one shell (default: bash, zsh, fish, powershell)
    #[arg(long, value_enum)]
    pub shell: Option<Shell>,

    /// Write the script to stdout instead of a file (requires --shell)
    #[arg(long, requires = "shell")]
    pub stdout: bool,
}

pub fn cmd_completions(args: CompletionsArgs) -> Result<(), String> {
    let mut cmd = relbump::command();

    if args.stdout {
        let shell = args.shell.ok_or("--stdout requires --shell")?;
        generate(shell, &mut cmd, BIN_NAME, &mut std::io::stdout());
        return Ok(());
    }

    let out_dir = crate::workspace_root().join(args.out_dir);
    fs::create_dir_all(&out_dir).map_err(|e| format!("{}: {e}", out_dir.display()))?;

    let shells = args.shell.map_or_else(
        || vec![Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell],
        |shell| vec![shell],
    );

    for shell in shells {
        let path = generate_to(shell, &mut cmd, BIN_NAME, &out_dir)
            .map_err(|e| format!("{shell} completions: {e}"))?;
        println!("wrote {}", path.display());
    }

    Ok(())
}

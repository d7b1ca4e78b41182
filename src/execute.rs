use anyhow::Result;
use clap::CommandFactory;
use colored::Colorize;
use goenv::config::Config;
use goenv::manager::Goenv;
use goenv::shell::{Persistence, SwitchResult};
use crate::cli::{Operation, CLI};

pub fn execute(cli: CLI) -> Result<()> {
    let operation = cli.operation();
    if matches!(operation, Operation::Help | Operation::Usage) {
        CLI::command().print_help()?;
        return Ok(());
    }

    let goenv = Goenv::new(Config::load()?);
    let outcome = match operation {
        Operation::ListInstalled => execute_list(&goenv),
        Operation::Uninstall(version) => execute_uninstall(&goenv, &version),
        Operation::ListRemote => execute_list_remote(&goenv),
        Operation::Install(version) => execute_install(&goenv, &version),
        Operation::Use(version) => execute_use(&goenv, &version),
        Operation::Help | Operation::Usage => Ok(()),
    };
    match outcome {
        Err(err) if err.is_recoverable() => {
            println!("{}", err.to_string().yellow());
            Ok(())
        }
        other => other.map_err(Into::into),
    }
}

pub fn execute_list(goenv: &Goenv) -> goenv::Result<()> {
    let records = goenv.list_installed()?;
    if records.is_empty() {
        println!("No installed Go versions found.");
        return Ok(());
    }
    println!("Installed Go versions:");
    for record in records {
        match record.is_active {
            true => {
                println!("{}", format!("* {}  (currently active)", record.version).green());
            },
            false => {
                println!("  {}", record.version);
            },
        }
    }
    Ok(())
}

pub fn execute_list_remote(goenv: &Goenv) -> goenv::Result<()> {
    for version in goenv.list_remote()? {
        println!("{version}");
    }
    Ok(())
}

pub fn execute_install(goenv: &Goenv, version: &str) -> goenv::Result<()> {
    println!("{}", format!("Installing Go version {version}...").green());
    println!("{}", goenv.config().archive_url(version));
    const MIB: f64 = 1024.0 * 1024.0;
    let mut last_reported = 0;
    let record = goenv.install(version, |read, total| {
        if read - last_reported < 256 * 1024 && Some(read) != total {
            return;
        }
        last_reported = read;
        match total {
            Some(total) => eprint!("\r  {:.1} / {:.1} MiB", read as f64 / MIB, total as f64 / MIB),
            None => eprint!("\r  {:.1} MiB", read as f64 / MIB),
        }
    });
    if last_reported > 0 {
        eprintln!();
    }
    let record = record?;
    println!(
        "{}",
        format!(
            "Go version {} is installed at {}.\nTo make this your default version, run 'goenv --use={}'",
            record.version,
            record.path.display(),
            record.version
        )
        .green()
    );
    Ok(())
}

pub fn execute_use(goenv: &Goenv, version: &str) -> goenv::Result<()> {
    let result = goenv.use_version(version)?;
    report_switch(&result);
    Ok(())
}

pub fn execute_uninstall(goenv: &Goenv, version: &str) -> goenv::Result<()> {
    let result = goenv.uninstall(version)?;
    if let Some(switch) = &result.switched {
        report_switch(switch);
        if let SwitchResult::Switched { version: other, .. } = switch {
            println!("Switched to Go version {other} before uninstalling {version}.");
        }
    }
    println!("Go version {} has been uninstalled.", result.version);
    Ok(())
}

fn report_switch(result: &SwitchResult) {
    match result {
        SwitchResult::AlreadyActive(version) => {
            println!("Go version {version} is already the active version.");
        }
        SwitchResult::Switched { version, env, persistence } => {
            // SAFETY: the CLI is single threaded and nothing else touches the
            // environment while a command runs.
            unsafe { env.apply() };
            println!("Using Go version {version}.");
            match persistence {
                Persistence::StartupFile(path) => {
                    println!("{}", format!("Please make sure to execute: source {}", path.display()).red());
                }
                Persistence::Unsupported(shell) => {
                    println!(
                        "{}",
                        format!(
                            "Shell `{shell}` is not supported, add {} to your PATH manually.",
                            env.goroot.join("bin").display()
                        )
                        .yellow()
                    );
                }
            }
        }
    }
}

// Writes flowsim.1 and one page per subcommand into the given directory (default: man/)

use clap::CommandFactory;
use flowsim::cli::Cli;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));
    std::fs::create_dir_all(&out_dir)?;

    let cmd = Cli::command();
    write_page(&out_dir, "flowsim", cmd.clone())?;
    for sub in cmd.get_subcommands() {
        let name = format!("flowsim-{}", sub.get_name());
        write_page(&out_dir, &name, sub.clone())?;
    }
    Ok(())
}

fn write_page(dir: &std::path::Path, name: &str, cmd: clap::Command) -> anyhow::Result<()> {
    let mut buffer = Vec::new();
    clap_mangen::Man::new(cmd).render(&mut buffer)?;
    let path = dir.join(format!("{}.1", name));
    std::fs::write(&path, buffer)?;
    println!("wrote {}", path.display());
    Ok(())
}

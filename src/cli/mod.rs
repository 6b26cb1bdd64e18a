pub mod command;

use clap::{App, AppSettings, Arg, SubCommand};
use colored::*;

/// 解析参数并执行对应命令，返回进程退出码（0 成功，非 0 失败）
pub fn run() -> i32 {
    let matches = build_app().get_matches();
    match command::dispatch(&matches) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{} {}", "❌ Error:".red().bold(), e);
            1
        }
    }
}

fn build_app<'a, 'b>() -> App<'a, 'b> {
    App::new("fragfs")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extent-based file storage inside a single image file")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("create")
                .about("Create and format a new image")
                .arg(
                    Arg::with_name("image")
                        .required(true)
                        .help("Path of the image file"),
                )
                .arg(
                    Arg::with_name("size")
                        .required(true)
                        .help("Total image size in bytes"),
                ),
        )
        .subcommand(
            SubCommand::with_name("copyin")
                .about("Import a host file into the image")
                .arg(Arg::with_name("image").required(true))
                .arg(
                    Arg::with_name("source")
                        .required(true)
                        .help("Host file to import"),
                )
                .arg(
                    Arg::with_name("name")
                        .required(true)
                        .help("Name to store inside the image"),
                ),
        )
        .subcommand(
            SubCommand::with_name("copyout")
                .about("Export a stored file to the host")
                .arg(Arg::with_name("image").required(true))
                .arg(Arg::with_name("name").required(true))
                .arg(
                    Arg::with_name("dest")
                        .required(true)
                        .help("Host path to write"),
                ),
        )
        .subcommand(
            SubCommand::with_name("ls")
                .about("List stored files")
                .arg(Arg::with_name("image").required(true))
                .arg(
                    Arg::with_name("all")
                        .short("a")
                        .long("all")
                        .help("Also show hidden (dot-prefixed) files"),
                ),
        )
        .subcommand(
            SubCommand::with_name("rm")
                .about("Delete a stored file")
                .arg(Arg::with_name("image").required(true))
                .arg(Arg::with_name("name").required(true)),
        )
        .subcommand(
            SubCommand::with_name("map")
                .about("Print region offsets and a block-map summary")
                .arg(Arg::with_name("image").required(true))
                .arg(
                    Arg::with_name("owners")
                        .long("owners")
                        .help("Annotate each run with the owning file"),
                ),
        )
        .subcommand(
            SubCommand::with_name("rmdisk")
                .about("Delete the backing image file itself")
                .arg(Arg::with_name("image").required(true))
                .arg(
                    Arg::with_name("force")
                        .short("f")
                        .long("force")
                        .help("Skip the confirmation prompt"),
                ),
        )
}

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};

use clap::{App, Arg};
use colored::*;

/// 占位文件生成器：按指定字节数创建稀疏文件。
/// 只负责撑出一个指定大小的文件，与镜像格式完全无关。
fn main() {
    let matches = App::new("mkfile")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Create a sparse placeholder file of the given size")
        .arg(
            Arg::with_name("file")
                .required(true)
                .help("Path of the file to create"),
        )
        .arg(Arg::with_name("size").required(true).help("Size in bytes"))
        .get_matches();

    let path = matches.value_of("file").unwrap();
    let size: u64 = match matches.value_of("size").unwrap().parse() {
        Ok(n) => n,
        Err(_) => {
            eprintln!(
                "{} size must be a non-negative byte count",
                "❌ Error:".red().bold()
            );
            std::process::exit(1);
        }
    };

    if let Err(e) = create_sparse(path, size) {
        eprintln!("{} {}", "❌ Error:".red().bold(), e);
        std::process::exit(1);
    }
    println!("🪶 Created '{}' ({} bytes)", path.green(), size);
}

// 定位到最后一个字节写入 0，文件即被撑到目标大小，中间全是空洞
fn create_sparse(path: &str, size: u64) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    if size > 0 {
        file.seek(SeekFrom::Start(size - 1))?;
        file.write_all(&[0])?;
    }
    Ok(())
}

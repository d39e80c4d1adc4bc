//! Drive a dispatcher by hand, the way a native driver would
//!
//! Run with: cargo run --example memory_volume

use std::sync::Arc;

use dokankit::{
    CreateArgs, CreationDisposition, DeviceOptions, Dispatcher, IntoStatus, MemoryFs,
    RequestInfo, VolumeInformation,
};

fn main() -> anyhow::Result<()> {
    let fs = Arc::new(MemoryFs::new());
    fs.add_file("/docs/readme.md", b"# readme\n")?;
    fs.add_file("/docs/todo.txt", b"- ship it\n")?;

    let dispatcher = Dispatcher::builder(fs.clone())
        .device_options(DeviceOptions::new("M:\\"))
        .volume(VolumeInformation::new().name("MEMORY"))
        .build();

    // Driver paths use backslashes and may carry dot segments.
    let req = RequestInfo::new(1).process_id(std::process::id());
    let path = "\\docs\\.\\notes.txt";
    let status = dispatcher
        .create(&req, path, &CreateArgs::new(CreationDisposition::CreateNew))
        .status();
    println!("create {path}: {status}");

    let written = dispatcher.write(&req, path, b"written through the dispatcher\n", 0);
    println!("write: {written:?}");
    let _ = dispatcher.cleanup(&req, path);
    let _ = dispatcher.close(&req, path);

    // List the directory with a pattern.
    let dir = RequestInfo::new(2);
    dispatcher
        .create(&dir, "\\docs", &CreateArgs::new(CreationDisposition::OpenExisting))
        .map_err(|status| anyhow::anyhow!("open \\docs: {status}"))?;
    for entry in dispatcher
        .enumerate_with_pattern(&dir, "\\docs", "*.TXT")
        .map_err(|status| anyhow::anyhow!("list \\docs: {status}"))?
    {
        println!("{:>6} {}", entry.size, entry.name);
    }
    let _ = dispatcher.cleanup(&dir, "\\docs");
    let _ = dispatcher.close(&dir, "\\docs");

    // Escaping the root never reaches the backend.
    let escape = dispatcher
        .create(
            &RequestInfo::new(3),
            "\\docs\\..\\..\\secret",
            &CreateArgs::new(CreationDisposition::OpenExisting),
        )
        .status();
    println!("escape attempt: {escape}");

    let volume = dispatcher.get_volume_information(32, 32).status();
    println!("volume info: {volume}; open handles: {}", dispatcher.open_handles());
    Ok(())
}

use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=proto/fulfillment.proto");

    let out_dir = PathBuf::from("src/generated");
    std::fs::create_dir_all(&out_dir).expect("Failed to create src/generated");

    // Regenerate from the .proto when a `protoc` is available. In environments
    // without one, fall back to the checked-in generated sources so the crate
    // still builds (the output is identical to what `protoc` would produce).
    if !protoc_available() {
        println!(
            "cargo:warning=protoc not found; using checked-in generated protobuf sources"
        );
        return;
    }

    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .out_dir(&out_dir)
        .compile_protos(&["proto/fulfillment.proto"], &["proto"])
        .expect("Failed to compile proto files");
}

fn protoc_available() -> bool {
    if let Some(path) = std::env::var_os("PROTOC") {
        return PathBuf::from(path).is_file();
    }
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join("protoc").is_file()))
        .unwrap_or(false)
}

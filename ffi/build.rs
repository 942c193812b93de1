fn main() {
    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-changed=cbindgen.toml");

    let crate_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let config = cbindgen::Config::from_file(format!("{crate_dir}/cbindgen.toml")).unwrap_or_default();

    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
    {
        Ok(bindings) => {
            let out_dir = std::env::var("OUT_DIR").unwrap_or_else(|_| format!("{crate_dir}/target"));
            bindings.write_to_file(format!("{out_dir}/pipeline.h"));
        }
        Err(e) => println!("cargo:warning=cbindgen failed: {e}"),
    }
}

use std::env;

fn main() {
    let crate_dir = env::var("CARGO_MANIFEST_DIR").unwrap();

    if let Ok(bindings) = cbindgen::Builder::new()
        .with_crate(crate_dir)
        .with_language(cbindgen::Language::C)
        .with_documentation(true)
        .with_include_guard("TEXTLITE_H")
        .with_no_includes()
        .with_pragma_once(true)
        .generate()
    {
        bindings.write_to_file("textlite.h");
    } else {
        println!("cargo:warning=Unable to generate C bindings");
    }

    println!("cargo:rerun-if-changed=src/lib.rs");
}

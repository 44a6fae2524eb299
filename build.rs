fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var_os("PROTOC").is_none() {
        let protoc = protoc_bin_vendored::protoc_bin_path()?;
        // SAFETY: the build script is single threaded at this point.
        unsafe { std::env::set_var("PROTOC", protoc) };
    }

    tonic_prost_build::configure().compile_protos(&["proto/simulation.proto"], &["proto"])?;

    Ok(())
}

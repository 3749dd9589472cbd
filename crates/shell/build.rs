//! Build script for ProtonWallet.Shell
//! Embeds Windows resource metadata

fn main() {
    #[cfg(windows)]
    {
        let mut res = winresource::WindowsResource::new();
        res.set("FileDescription", "ProtonWallet.Shell");
        res.set("ProductName", "Proton Wallet");
        res.set("InternalName", "ProtonWallet.Shell");
        res.set("OriginalFilename", "ProtonWallet_Shell.exe");
        res.set("ProductVersion", env!("CARGO_PKG_VERSION"));

        if let Err(e) = res.compile() {
            println!("cargo:warning=Failed to compile Windows resources: {}", e);
        }
    }
}

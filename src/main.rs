fn main() {
    if let Err(e) = civitas::run() {
        // Rejections are the caller's to fix; anything else is a store fault.
        std::process::exit(if e.is_rejection() { 2 } else { 1 });
    }
}

use tracing_subscriber::EnvFilter;

/// Installs the stderr subscriber.
///
/// `-v` raises the `xdp.*` targets to info and `-vv` to debug; everything
/// else stays at warn. `RUST_LOG` replaces the whole filter when set.
pub fn init_logging(verbose: u8) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(verbose > 1)
		.with_writer(std::io::stderr)
		.try_init();
}

fn default_directives(verbose: u8) -> String {
	let level = match verbose {
		0 => "warn",
		1 => "info",
		_ => "debug",
	};
	format!("warn,xdp={level}")
}

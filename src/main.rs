mod args;

use std::{path::Path, sync::Arc};

use strata::{
	definition::{LoadError, Source},
	fmt,
	term::color,
	Context,
	Runtime,
	Settings,
	Signal,
};

use args::{Args, Command};


fn main() -> ! {
	env_logger::Builder::from_default_env()
		.format_timestamp(None)
		.init();

	let command = match args::parse(std::env::args_os()) {
		Ok(command) => command,
		Err(error) => {
			eprint!("{}", error);
			std::process::exit(1)
		}
	};

	let exit_code = match command {
		Command::Run(args) => run(args),
		Command::Help(msg) | Command::Version(msg) => {
			println!("{}", msg);
			0
		},
	};

	std::process::exit(exit_code)
}


fn run(args: Args) -> i32 {
	let table = match load(&args) {
		Ok(table) => table,
		Err(error) => {
			eprintln!("{}: {}", color::Fg(color::Red, "Error"), error);
			return 2;
		}
	};

	let main = match table.main() {
		Some(main) => main,
		None => {
			eprintln!("{}: the site declares no main definition", color::Fg(color::Red, "Error"));
			return 2;
		}
	};

	let runtime = Runtime::new(
		Settings {
			size_limit: args.limit,
			threshold: args.threshold,
		}
	);

	let table = Arc::new(table);
	log::info!("constructing {}", fmt::Show(main, table.as_ref()));

	let mut context = Context::new(runtime.clone(), table);
	let result = context.construct(main, Vec::new().into());
	drop(context);

	if args.stats {
		eprintln!("{}", runtime.stats());
	}

	match result {
		Ok(value) => {
			println!("{}", value.unwrap_or_default());
			0
		}

		Err(signal @ Signal::Redirection(_)) => {
			eprintln!("{}", signal);
			3
		}

		Err(signal) => {
			eprintln!("{}", signal);
			1
		}
	}
}


fn load(args: &Args) -> Result<strata::Table, LoadError> {
	let source = match &args.path {
		Some(path) => Source::from_path(path.as_path())?,
		None => Source::from_reader(Path::new("<stdin>"), std::io::stdin().lock())?,
	};

	source.load()
}

use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use anise_core::error::ERROR_TAG;
use anise_core::runtime::{Interpret, RunOptions};

fn help() -> ! {
    println!("Usage: anise [-trace|-t] [-big|-b] [-stat|-s] [file]");
    println!();
    println!("Options:");
    println!("  -trace, -t   trace function calls");
    println!("  -big, -b     use arbitrary-precision integers");
    println!("  -stat, -s    dump the function registry after the run");
    println!("  -h, --help   show this help");
    println!();
    println!("With no file the program is read from standard input.");
    std::process::exit(0);
}

fn main() {
    process::exit(run());
}

fn run() -> i32 {
    let mut trace = false;
    let mut big = false;
    let mut stat = false;
    let mut file: Option<PathBuf> = None;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "-trace" | "-t" => trace = true,
            "-big" | "-b" => big = true,
            "-stat" | "-s" => stat = true,
            "-h" | "--help" => help(),
            other if other.starts_with('-') => {
                eprintln!("unknown option: {}", other);
                help();
            }
            _ => {
                if file.is_some() {
                    eprintln!("expected a single program file");
                    return 1;
                }
                file = Some(PathBuf::from(arg));
            }
        }
    }

    let options = RunOptions {
        trace,
        big_int: big,
        builtin_dir: locate_builtin_dir(trace),
    };
    let interp = Interpret::with_options(Box::new(io::stdout()), options);

    let from_stdin = file.is_none();
    let source = match &file {
        Some(path) => match fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("{} cannot read {}: {}", ERROR_TAG, path.display(), err);
                return 1;
            }
        },
        None => {
            let mut source = String::new();
            if let Err(err) = io::stdin().read_to_string(&mut source) {
                eprintln!("{} cannot read standard input: {}", ERROR_TAG, err);
                return 1;
            }
            source
        }
    };

    let outcome = interp
        .load_program(&source)
        .and_then(|_| interp.check())
        .and_then(|_| {
            // When the program itself came over stdin there is nothing
            // left for `__stdin` to read.
            if from_stdin {
                interp.run_with_input(io::empty())
            } else {
                interp.run()
            }
        });
    if let Err(err) = outcome {
        eprintln!("{} {}", ERROR_TAG, err);
        return 1;
    }
    if stat {
        interp.stat();
    }
    0
}

/// The builtin library lives next to the executable, overridable through
/// ANISE_BUILTIN. A missing directory is tolerated so a bare binary still
/// runs.
fn locate_builtin_dir(trace: bool) -> Option<PathBuf> {
    let dir = match env::var_os("ANISE_BUILTIN") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let exe = env::current_exe().ok()?;
            exe.parent()?.join("builtin")
        }
    };
    if dir.is_dir() {
        if trace {
            eprintln!("trace: builtin dir {}", dir.display());
        }
        Some(dir)
    } else {
        if trace {
            eprintln!("trace: no builtin dir at {}", dir.display());
        }
        None
    }
}

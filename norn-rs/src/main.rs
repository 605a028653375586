use std::sync::Arc;

use tokio::net::TcpListener;

use norn::cli;
use norn::console;
use norn::environment::Environment;
use norn::session;
use norn::web;

#[tokio::main]
async fn main() {
    let ver = env!("CARGO_PKG_VERSION");
    println!("norn {ver} - mailing list expression console");

    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("norn: {e}");
            eprintln!("Usage: norn [-p<port>] [-f<file>] [-n]");
            std::process::exit(1);
        }
    };

    let env = Arc::new(Environment::new());

    if let Some(path) = &args.load_file {
        if let Err(e) = session::load(&env, path) {
            eprintln!("norn: cannot load {}: {e}", path.display());
            std::process::exit(1);
        }
        println!("loaded {} definitions from {}", env.names().len(), path.display());
    }

    if !args.no_web {
        match TcpListener::bind(("127.0.0.1", args.port)).await {
            Ok(listener) => {
                println!("web interface at http://127.0.0.1:{}/eval/", args.port);
                let env = Arc::clone(&env);
                tokio::spawn(async move {
                    if let Err(e) = web::serve(listener, env).await {
                        eprintln!("norn: web: {e}");
                    }
                });
            }
            Err(e) => {
                eprintln!("norn: cannot listen on port {}: {e}", args.port);
                std::process::exit(1);
            }
        }
    }

    if let Err(e) = console::run(env).await {
        eprintln!("norn: {e}");
        std::process::exit(1);
    }
}

use clap::{arg, command, value_parser, Command};
use tracing_subscriber::EnvFilter;

mod errors;
mod extract;
mod ocr;
mod preprocess;
mod server;

use server::ServerConf;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let matches = command!()
        .subcommand(
            Command::new("server")
                .about("run id card ocr server")
                .arg(
                    arg!(-l --host <HOST> "server listen host")
                        .default_value("127.0.0.1")
                )
                .arg(
                    arg!(-p --port <PORT> "server listen port")
                        .default_value("5000")
                        .value_parser(value_parser!(u16))
                )
                .arg(
                    arg!(-d --tesseract_data <TESSERACT_DATA> "tesseract data path")
                        .default_value("tessdata")
                )
                .arg(
                    arg!(-u --default_lang <DEFAULT_LANG> "tesseract default language")
                        .default_value("eng")
                )
        )
        .get_matches();

    let mut conf = ServerConf::default();
    if let Some(server_matches) = matches.subcommand_matches("server") {
        conf.host = server_matches.get_one::<String>("host").expect("host must input").to_owned();
        conf.port = *server_matches.get_one::<u16>("port").expect("port must input");
        conf.tesseract_data = server_matches.get_one::<String>("tesseract_data").expect("tesseract data must input").to_owned();
        conf.tesseract_default_lang = server_matches.get_one::<String>("default_lang").expect("tesseract default language must input").to_owned();

        // check default tesseract default lang traineddata exists
        let traineddata_path = format!("{}/{}.traineddata", conf.tesseract_data, conf.tesseract_default_lang);
        if !std::path::Path::new(&traineddata_path).exists() {
            tracing::error!("tesseract default lang traineddata not exists: {}", traineddata_path);
            std::process::exit(1);
        }

        let server_rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .expect("create tokio runtime error");

        let ret = server_rt.block_on(server::run_server(conf.clone()));
        if let Err(e) = ret {
            tracing::error!("run server error: {}", e);
            std::process::exit(1);
        }
    }
}

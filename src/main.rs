use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = chatgw::cli::Cli::parse();
    match chatgw::cli::run(cli).await {
        Ok(None) => {}
        Ok(Some(value)) => match serde_json::to_string_pretty(&value) {
            Ok(text) => println!("{}", text),
            Err(err) => {
                eprintln!("chatgw: {}", err);
                std::process::exit(1);
            }
        },
        Err(err) => {
            let rendered = serde_json::to_string_pretty(&err).unwrap_or_else(|_| err.to_string());
            eprintln!("{}", rendered);
            std::process::exit(1);
        }
    }
}

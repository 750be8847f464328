use clap::{Parser, Subcommand, ValueEnum};
use radius_client::{ClientConfig, Endpoint, RadiusClient};
use radius_proto::{
    AccessRequest, AccountingRequest, AcctStatusType, Attribute, AttributeType, AuthProtocol,
    Code, PacketCodec, RadiusPacket,
};
use std::process;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// USG RADIUS Client - send Access and Accounting requests to a RADIUS server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "radius-client")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "CONFIG", default_value = "client.json")]
    config: String,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send an Access-Request
    Auth {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        password: String,
        /// Use CHAP instead of PAP
        #[arg(long)]
        chap: bool,
    },
    /// Send an Accounting-Request
    Acct {
        #[arg(short, long)]
        user: String,
        #[arg(short, long, value_enum, default_value = "start")]
        status: Status,
        #[arg(long)]
        session_id: Option<String>,
    },
    /// Send a Status-Server probe
    Status,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Status {
    Start,
    Stop,
    InterimUpdate,
    AccountingOn,
    AccountingOff,
}

impl From<Status> for AcctStatusType {
    fn from(status: Status) -> Self {
        match status {
            Status::Start => AcctStatusType::Start,
            Status::Stop => AcctStatusType::Stop,
            Status::InterimUpdate => AcctStatusType::InterimUpdate,
            Status::AccountingOn => AcctStatusType::AccountingOn,
            Status::AccountingOff => AcctStatusType::AccountingOff,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load or create configuration (without logging first)
    let config = match ClientConfig::from_file(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing_subscriber::registry()
                .with(EnvFilter::new("info"))
                .with(tracing_subscriber::fmt::layer())
                .init();

            if cli.validate {
                eprintln!("Configuration validation failed: {}", e);
                process::exit(1);
            }

            warn!("Could not load config file from {}: {}", cli.config, e);
            info!("Creating example configuration at: {}", cli.config);

            if let Err(e) = ClientConfig::example().to_file(&cli.config) {
                error!("Error creating example config: {}", e);
                process::exit(1);
            }

            info!("Please edit {} and run again", cli.config);
            process::exit(0);
        }
    };

    if cli.validate {
        println!("Configuration validated successfully");
        println!("  Server: {}", config.server);
        println!("  Bind: {}", config.bind_address);
        println!("  Max attempts: {}", config.retry.max_attempts);
        println!("  Retry wait: {} ms", config.retry.retry_wait_ms);
        process::exit(0);
    }

    let log_level = config.log_level.as_deref().unwrap_or("info");
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let Some(command) = cli.command else {
        error!("No command given, try --help");
        process::exit(2);
    };

    if let Err(e) = run(&config, command).await {
        error!("{}", e);
        process::exit(1);
    }
}

async fn run(config: &ClientConfig, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let client = RadiusClient::from_config(config).await?;
    let endpoint = Endpoint::new(config.server_addr()?, config.secret.as_bytes());
    let identifier = client.next_identifier();

    let request: RadiusPacket = match command {
        Command::Auth {
            user,
            password,
            chap,
        } => {
            let mut request = AccessRequest::with_credentials(identifier, &user, &password)?;
            if chap {
                request.set_auth_protocol(AuthProtocol::Chap);
            }
            request.into()
        }
        Command::Acct {
            user,
            status,
            session_id,
        } => {
            let mut request = AccountingRequest::with_status(identifier, &user, status.into())?;
            if let Some(session_id) = session_id {
                request.packet_mut().add_attribute(Attribute::string(
                    AttributeType::AcctSessionId.as_u8(),
                    session_id,
                )?);
            }
            request.into()
        }
        Command::Status => RadiusPacket::new(Code::StatusServer, identifier),
    };

    info!(
        code = %request.code(),
        identifier,
        server = %endpoint.address,
        "Sending request"
    );
    let response = client.communicate(&request, &endpoint).await?;
    print_response(client.codec(), &response);

    Ok(())
}

fn print_response(codec: &PacketCodec, response: &RadiusPacket) {
    println!("{} (id {})", response.code(), response.identifier());
    for attribute in &response.packet().attributes {
        let name = codec
            .dictionary()
            .resolve(attribute.vendor_id, attribute.attr_type)
            .map(|definition| definition.name.clone())
            .unwrap_or_else(|| match attribute.vendor_id {
                Some(vendor_id) => format!("Vendor-{}-Attr-{}", vendor_id, attribute.attr_type),
                None => format!("Attr-{}", attribute.attr_type),
            });
        match codec.attribute_value(attribute) {
            Ok(value) => println!("  {} = {}", name, value),
            Err(_) => println!("  {} = {:02x?}", name, attribute.value),
        }
    }
}

use mongodb_operator::{init_tracing, ControllerConfig, Operator};

#[tokio::main]
async fn main() -> mongodb_operator::Result<()> {
    init_tracing();

    let config = ControllerConfig::from_env()?;
    Operator::new(config).run().await
}

use bacsim_datalink::BacnetIpTransport;
use bacsim_device::SimulatedDevice;
use bacsim_tools::SimulatorArgs;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = SimulatorArgs::parse();
    let config = args.device_config()?;
    let transport = BacnetIpTransport::bind(args.bind_addr()).await?;
    let device =
        SimulatedDevice::new(&config, transport)?.with_broadcast_address(args.broadcast_addr());

    println!(
        "Simulated device {} ({}) running with {} objects on {}. Ctrl+C to stop.",
        config.instance,
        config.name(),
        config.objects.len(),
        args.bind_addr()
    );
    tokio::select! {
        result = device.run() => result?,
        _ = tokio::signal::ctrl_c() => log::info!("interrupted, shutting down"),
    }
    Ok(())
}

use clap::{App, Arg, ArgMatches, SubCommand};
use ncm_buffers::{
    config::{DEFAULT_SLOT_COUNT, DEFAULT_TX_PAYLOAD_SIZE},
    BufferError, ContinuousBufferSource, MemoryClass, MemoryRegion, RequestStatus, Result,
    RxBufferQueue, RxQueueConfig, TxBufferRequestPool, TxPoolConfig,
};
use std::{sync::Arc, time::Instant};

fn main() -> Result<()> {
    env_logger::init();

    let matches = App::new("ncm-buffers-cli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("NCM adapter TX/RX buffer pool exerciser")
        .subcommand(
            SubCommand::with_name("tx")
                .about("Cycle the TX buffer/request pool")
                .arg(
                    Arg::with_name("payload_size")
                        .short("p")
                        .long("payload-size")
                        .value_name("SIZE")
                        .help("Payload bytes per buffer")
                        .default_value("1536")
                        .takes_value(true),
                )
                .arg(slots_arg())
                .arg(cycles_arg())
                .arg(paged_arg()),
        )
        .subcommand(
            SubCommand::with_name("rx")
                .about("Cycle the RX buffer queue")
                .arg(
                    Arg::with_name("mode")
                        .short("m")
                        .long("mode")
                        .value_name("MODE")
                        .help("Buffer ownership mode")
                        .possible_values(&["external", "polled"])
                        .default_value("external")
                        .takes_value(true),
                )
                .arg(slots_arg())
                .arg(cycles_arg())
                .arg(paged_arg()),
        )
        .subcommand(SubCommand::with_name("info").about("Show version and defaults"))
        .get_matches();

    match matches.subcommand() {
        ("tx", Some(tx_matches)) => run_tx(tx_matches),
        ("rx", Some(rx_matches)) => run_rx(rx_matches),
        ("info", Some(_)) => show_info(),
        _ => {
            println!("Use --help for usage information");
            Ok(())
        }
    }
}

fn slots_arg() -> Arg<'static, 'static> {
    Arg::with_name("slots")
        .short("s")
        .long("slots")
        .value_name("COUNT")
        .help("Number of slots")
        .default_value("128")
        .takes_value(true)
}

fn cycles_arg() -> Arg<'static, 'static> {
    Arg::with_name("cycles")
        .short("c")
        .long("cycles")
        .value_name("COUNT")
        .help("Number of take/return cycles")
        .default_value("100000")
        .takes_value(true)
}

fn paged_arg() -> Arg<'static, 'static> {
    Arg::with_name("paged")
        .long("paged")
        .help("Use pageable memory instead of locking slot memory resident")
}

fn parse_count(matches: &ArgMatches, name: &str) -> Result<usize> {
    matches
        .value_of(name)
        .ok_or_else(|| BufferError::invalid_parameter(name, "Missing value"))?
        .parse()
        .map_err(|_| BufferError::invalid_parameter(name, "Invalid number"))
}

fn memory_class(matches: &ArgMatches) -> MemoryClass {
    if matches.is_present("paged") {
        MemoryClass::Paged
    } else {
        MemoryClass::NonPaged
    }
}

fn run_tx(matches: &ArgMatches) -> Result<()> {
    let payload_size = parse_count(matches, "payload_size")?;
    let slots = parse_count(matches, "slots")?;
    let cycles = parse_count(matches, "cycles")?;

    let config = TxPoolConfig::new("cli-tx", payload_size)
        .with_slot_count(slots)
        .with_memory_class(memory_class(matches));
    config.validate()?;
    println!(
        "Creating TX pool: {} slots x {} bytes ({} bytes total)",
        slots,
        payload_size,
        config.total_memory_required()
    );
    let pool = TxBufferRequestPool::create(config)?;
    println!("  Resident: {}", pool.is_resident());

    let frame: Vec<u8> = (0..payload_size).map(|i| i as u8).collect();
    let start = Instant::now();
    let mut exhausted = 0usize;

    for cycle in 0..cycles {
        let Some(mut lease) = pool.get() else {
            exhausted += 1;
            continue;
        };
        let len = (cycle % payload_size).max(1);
        lease.fill(&frame[..len])?;
        lease.stats_mut().record_datagram(len, 0);
        lease.request_mut().submit(len)?;
        lease.request_mut().complete(RequestStatus::Success, len);
        pool.put(lease);
    }

    let elapsed = start.elapsed();
    println!("\nResults:");
    println!("  Total time: {:.2}ms", elapsed.as_secs_f64() * 1000.0);
    println!("  Cycles/sec: {:.0}", cycles as f64 / elapsed.as_secs_f64());
    println!("  Exhausted gets: {}", exhausted);
    println!("  {}", pool.stats().summary());
    Ok(())
}

fn run_rx(matches: &ArgMatches) -> Result<()> {
    let slots = parse_count(matches, "slots")?;
    let cycles = parse_count(matches, "cycles")?;
    let polled = matches.value_of("mode") == Some("polled");

    let queue = RxBufferQueue::create(
        RxQueueConfig::new("cli-rx")
            .with_slot_count(slots)
            .with_memory_class(memory_class(matches)),
    )?;
    println!(
        "Created RX queue: {} descriptors, {} mode",
        queue.capacity(),
        if polled { "polled" } else { "external" }
    );

    let reader = Arc::new(ContinuousBufferSource::new(
        "cli-reader",
        slots,
        DEFAULT_TX_PAYLOAD_SIZE,
    ));
    let region = MemoryRegion::allocate(DEFAULT_TX_PAYLOAD_SIZE);

    let start = Instant::now();
    let mut received = 0u64;

    for cycle in 0..cycles {
        let enqueued = if polled {
            match reader.take() {
                Some(buffer) => {
                    let len = (cycle % buffer.len()).max(1);
                    queue.enqueue_polled(buffer, len, reader.clone())
                }
                None => Err(BufferError::pool_exhausted("cli-reader")),
            }
        } else {
            queue.enqueue_external(&region)
        };
        if let Err(err) = enqueued {
            if !err.is_exhausted() {
                return Err(err);
            }
        }

        // Drain every other cycle so the queue sees some depth.
        if cycle % 2 == 1 {
            while let Some(lease) = queue.dequeue() {
                received += lease.data().len() as u64;
                queue.return_buffer(lease);
            }
        }
    }
    queue.drain();

    let elapsed = start.elapsed();
    println!("\nResults:");
    println!("  Total time: {:.2}ms", elapsed.as_secs_f64() * 1000.0);
    println!("  Cycles/sec: {:.0}", cycles as f64 / elapsed.as_secs_f64());
    println!("  Bytes received: {}", received);
    if polled {
        println!("  Buffers put back: {}", reader.put_backs());
    } else {
        println!("  Region references: {}", region.ref_count());
    }
    println!("  {}", queue.stats().summary());
    Ok(())
}

fn show_info() -> Result<()> {
    println!("ncm-buffers {}", ncm_buffers::VERSION);
    println!("\nDefaults:");
    println!("  Slots per pool: {}", DEFAULT_SLOT_COUNT);
    println!("  TX payload size: {} bytes", DEFAULT_TX_PAYLOAD_SIZE);
    println!("\nPlatform:");
    if cfg!(unix) {
        println!("  Resident slot memory via mlock");
    } else {
        println!("  Resident slot memory unavailable; slots stay pageable");
    }
    Ok(())
}

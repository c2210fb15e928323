use std::io::BufRead;

use embassy_executor::Spawner;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Instant, Timer};
use env_logger::Builder;
use log::{LevelFilter, log};
use packet_radio_link::radio_devices::EchoTransceiver;
use packet_radio_link::shell::format_outcome;
use packet_radio_link::{LinkConfiguration, RadioLink, parse_command};

const CONSOLE_LINE_SIZE: usize = 64;
const CONSOLE_QUEUE_SIZE: usize = 4;
const POLL_PERIOD: Duration = Duration::from_millis(10);

type ConsoleLine = heapless::String<CONSOLE_LINE_SIZE>;

static CONSOLE_LINES: Channel<CriticalSectionRawMutex, ConsoleLine, CONSOLE_QUEUE_SIZE> = Channel::new();

fn spawn_console_reader() {
    std::thread::spawn(|| {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let mut console_line = ConsoleLine::new();
            if console_line.push_str(line.trim_end()).is_err() {
                log!(log::Level::Warn, "Command longer than {} characters ignored", CONSOLE_LINE_SIZE);
                continue;
            }
            if CONSOLE_LINES.try_send(console_line).is_err() {
                log!(log::Level::Warn, "Console busy, command dropped");
            }
        }
    });
}

#[embassy_executor::task]
async fn run(mut link: RadioLink<EchoTransceiver>) -> ! {
    let mut out = String::new();
    loop {
        if let Ok(line) = CONSOLE_LINES.try_receive() {
            match parse_command(&line) {
                Ok(Some(command)) => {
                    let _ = link.execute(command, &mut out);
                }
                Ok(None) => println!("Unknown command: {}", line),
                Err(error) => eprintln!("{}", error),
            }
        }

        if let Some(outcome) = link.poll() {
            let _ = format_outcome(&outcome, &mut out);
        }
        if let Some(question) = link.poll_contest_sender(Instant::now()) {
            log!(log::Level::Debug, "Contest sender issued {}", question);
        }

        if !out.is_empty() {
            print!("{}", out);
            out.clear();
        }
        Timer::after(POLL_PERIOD).await;
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    Builder::new().filter_level(LevelFilter::Info).parse_default_env().init();

    log!(log::Level::Info, "Starting radio link demo, type 'radio help'");
    let mut link = RadioLink::new(EchoTransceiver::silent(), LinkConfiguration::new());
    if std::env::args().any(|arg| arg == "--contest-sender") {
        link.set_contest_mode(true);
        link.set_contest_sender(true, Instant::now().as_ticks());
    }

    spawn_console_reader();
    if let Err(error) = spawner.spawn(run(link)) {
        log!(log::Level::Error, "Failed to spawn radio link task: {:?}", error);
    }
}

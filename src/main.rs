use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::process::ExitCode;

use mapmatch::config::MatchOptions;
use mapmatch::error::MatchError;
use mapmatch::ingest::read_observations;
use mapmatch::store::{InMemorySegmentStore, RoadSegmentInput};
use mapmatch::viterbi::match_trace;

/// No-starting-candidates gets its own exit code; everything else fatal is
/// a plain startup error.
const EXIT_NO_STARTING_CANDIDATES: u8 = 2;

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let network_path = args.next().unwrap_or_else(|| "network.json".to_string());
    let observations_path = args.next().unwrap_or_else(|| "observations.csv".to_string());
    let output_path = args.next();

    match run(&network_path, &observations_path, output_path.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(MatchError::NoStartingCandidates) = err.downcast_ref::<MatchError>() {
                eprintln!("error: {err}");
                return ExitCode::from(EXIT_NO_STARTING_CANDIDATES);
            }
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(network_path: &str, observations_path: &str, output_path: Option<&str>) -> Result<(), Box<dyn Error>> {
    println!("Loading road network from {network_path}...");
    let segments = load_network(network_path)?;
    println!("Loaded {} road segments.", segments.len());
    let store = InMemorySegmentStore::from_geodesic(segments);

    println!("Loading observations from {observations_path}...");
    let file = File::open(observations_path)?;
    let observations = read_observations(file)?;
    println!("Loaded {} observations.", observations.len());

    let options = MatchOptions::default();

    let path = match output_path {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            match_trace(&observations, &options, &store, Some(&mut writer))?
        }
        None => match_trace(&observations, &options, &store, None)?,
    };

    println!("Matched {} segments:", path.len());
    for segment_id in &path {
        println!("{segment_id}");
    }

    Ok(())
}

fn load_network(path: &str) -> Result<Vec<RoadSegmentInput>, Box<dyn Error>> {
    let file = File::open(path)?;
    let segments: Vec<RoadSegmentInput> = serde_json::from_reader(file)?;
    Ok(segments)
}

//! Subcommand dispatch
//!
//! Translates parsed options into demo configs, runs them on the selected
//! backend and prints the reports.

use crate::backend;
use crate::{BackendKind, Cli, Commands, GlobalOpts, InputState, SwapVariant};
use anyhow::{bail, Context, Result};
use qdemo_algorithms::prelude::*;
use qdemo_backend::report::{summary_table, SummaryRow};
use qdemo_backend::{Backend, DemoReport};
use qdemo_ibm::{list_backends, BackendInfo, IbmCredentials};
use qdemo_protocols::prelude::*;
use qdemo_protocols::superdense::ALL_MESSAGES;
use qdemo_qec::prelude::*;

/// Run the parsed command
pub fn execute(cli: &Cli) -> Result<()> {
    let opts = &cli.global;
    match &cli.command {
        Commands::ListBackends => print_backends(),
        Commands::All => {
            let kind = match opts.backend {
                Some(BackendKind::Noisy) => BackendKind::Noisy,
                _ => BackendKind::Simulator,
            };
            let backend = backend::simulator(kind, opts.seed);
            let reports = run_all(&backend, opts)?;
            for report in &reports {
                println!("{}\n", report);
            }
            let rows: Vec<SummaryRow> = reports.iter().map(|r| SummaryRow::from_report(r.as_ref())).collect();
            println!("{}", summary_table(&rows));
            Ok(())
        }
        command => {
            let backend = backend::select(opts, command.min_qubits())?;
            run_command(backend.as_ref(), opts, command)
        }
    }
}

fn logical_state(input: InputState) -> LogicalState {
    match input {
        InputState::Zero => LogicalState::Zero,
        InputState::One => LogicalState::One,
        InputState::Plus => LogicalState::Plus,
        InputState::Minus => LogicalState::Minus,
    }
}

fn parse_errors(specs: &[String], default_cases: fn() -> Vec<Option<InjectedError>>) -> Result<Vec<Option<InjectedError>>> {
    if specs.is_empty() {
        return Ok(default_cases());
    }
    specs
        .iter()
        .map(|s| {
            if s.eq_ignore_ascii_case("none") {
                Ok(None)
            } else {
                s.parse::<InjectedError>()
                    .map(Some)
                    .with_context(|| format!("parsing error spec '{}'", s))
            }
        })
        .collect()
}

fn encoded_bit(initial: u8) -> Result<bool> {
    match initial {
        0 => Ok(false),
        1 => Ok(true),
        other => bail!("encoded bit must be 0 or 1, got {}", other),
    }
}

fn run_repetition(
    backend: &dyn Backend,
    opts: &GlobalOpts,
    kind: CodeKind,
    initial: u8,
    error_qubit: usize,
    no_error: bool,
    sweep: bool,
) -> Result<()> {
    let initial = encoded_bit(initial)?;
    if sweep {
        let configs = repetition::all_error_cases(kind, initial);
        let reports = repetition::run_sweep(backend, &configs, opts.shots)?;
        for report in &reports {
            println!("{}\n", report);
        }
        let rows: Vec<SummaryRow> = reports.iter().map(|r| SummaryRow::from_report(r)).collect();
        println!("{}", summary_table(&rows));
        return Ok(());
    }
    let error = if no_error { None } else { Some(error_qubit) };
    let config = RepetitionConfig::new(kind).with_initial(initial).with_error_qubit(error);
    print_report(&repetition::run(backend, &config, opts.shots)?);
    Ok(())
}

fn print_report(report: &dyn DemoReport) {
    println!("{}", report);
    log::info!("{}: {}", report.title(), if report.succeeded() { "ok" } else { "failed" });
}

fn run_command(backend: &dyn Backend, opts: &GlobalOpts, command: &Commands) -> Result<()> {
    let shots = opts.shots;
    match command {
        Commands::Deutsch { oracle } => {
            let oracles = match oracle {
                Some(name) => vec![name.parse::<DeutschOracle>()?],
                None => DeutschOracle::ALL.to_vec(),
            };
            print_report(&deutsch::run(backend, &oracles, shots)?);
        }
        Commands::DeutschJozsa {
            inputs,
            constant,
            pattern,
        } => {
            let mut config = DeutschJozsaConfig::default().with_inputs(*inputs);
            match (constant, pattern) {
                (Some(0), _) => config = config.with_oracle(DjOracle::Constant0),
                (Some(1), _) => config = config.with_oracle(DjOracle::Constant1),
                (Some(other), _) => bail!("constant oracle must return 0 or 1, got {}", other),
                (None, Some(p)) => config = config.with_oracle(DjOracle::balanced_from_str(p)?),
                (None, None) => {}
            }
            print_report(&deutsch_jozsa::run(backend, &config, shots)?);
        }
        Commands::BernsteinVazirani { secret, sweep } => {
            if *sweep {
                let reports = bernstein_vazirani::run_sweep(backend, &bernstein_vazirani::SWEEP_SECRETS, shots)?;
                for report in &reports {
                    println!("{}\n", report);
                }
                println!("{}", bernstein_vazirani::sweep_summary(&reports));
            } else {
                print_report(&bernstein_vazirani::run(backend, secret, shots)?);
            }
        }
        Commands::Grover { marked, iterations } => {
            let marked: Vec<&str> = marked.iter().map(String::as_str).collect();
            let mut config = GroverConfig::new(&marked);
            if let Some(k) = iterations {
                config = config.with_iterations(*k);
            }
            print_report(&grover::run(backend, &config, shots)?);
        }
        Commands::Qft { qubits, input, forward } => {
            let mode = if *forward { QftMode::Forward } else { QftMode::RoundTrip };
            let config = QftConfig::default().with_qubits(*qubits).with_input(*input).with_mode(mode);
            print_report(&qft::run(backend, &config, shots)?);
        }
        Commands::Qpe { counting, phase } => {
            let config = QpeConfig::default().with_counting_qubits(*counting).with_phase(*phase);
            print_report(&qpe::run(backend, &config, shots)?);
        }
        Commands::Shor { number, base, counting } => {
            let config = ShorConfig::default()
                .with_n(*number)
                .with_base(*base)
                .with_counting_qubits(*counting);
            print_report(&shor::run(backend, &config, shots)?);
        }
        Commands::Qaoa {
            nodes,
            layers,
            iterations,
        } => {
            let config = QaoaConfig::default()
                .with_graph(Graph::ring(*nodes))
                .with_layers(*layers)
                .with_iterations(*iterations)
                .with_seed(opts.seed);
            print_report(&qaoa::run(backend, &config, shots)?);
        }
        Commands::Vqe { layers, iterations } => {
            let config = VqeConfig::default()
                .with_layers(*layers)
                .with_iterations(*iterations)
                .with_seed(opts.seed);
            print_report(&vqe::run(backend, &config, shots)?);
        }
        Commands::SwapTest { variant } => {
            let variant = match variant {
                SwapVariant::Ancilla => SwapTestVariant::Ancilla,
                SwapVariant::Destructive => SwapTestVariant::Destructive,
            };
            print_report(&swap_test::run(backend, &swap_test::default_cases(), variant, shots)?);
        }
        Commands::QuantumWalk { steps, search } => {
            let mut config = match search {
                Some(marked) => WalkConfig::search(*marked),
                None => WalkConfig::default(),
            };
            if let Some(steps) = steps {
                config = config.with_steps(*steps);
            }
            if let WalkMode::Search { marked } = config.mode {
                log::debug!("Searching for vertex {} in {} steps", marked, config.steps);
            }
            print_report(&quantum_walk::run(backend, &config, shots)?);
        }
        Commands::AmplitudeEstimation { amplitude, counting } => {
            let config = AeConfig::default()
                .with_amplitude(*amplitude)
                .with_counting_qubits(*counting);
            print_report(&amplitude_estimation::run(backend, &config, shots)?);
        }
        Commands::QuantumCounting {
            marked,
            search,
            counting,
        } => {
            let config = CountingConfig::new(marked)
                .with_search_qubits(*search)
                .with_counting_qubits(*counting);
            print_report(&quantum_counting::run(backend, &config, shots)?);
        }
        Commands::Hhl { two_by_two, rhs } => {
            let system = if *two_by_two { LinearSystem::TwoByTwo } else { LinearSystem::Simple };
            let config = HhlConfig::default().with_system(system).with_rhs(*rhs);
            print_report(&hhl::run(backend, &config, shots)?);
        }
        Commands::Simon { secret, sweep } => {
            if *sweep {
                let reports = simon::run_sweep(backend, &simon::SWEEP_SECRETS, shots)?;
                for report in &reports {
                    println!("{}\n", report);
                }
                println!("{}", simon::sweep_summary(&reports));
            } else {
                print_report(&simon::run(backend, secret, shots)?);
            }
        }
        Commands::Teleportation { deferred, theta, phi } => {
            let mode = if *deferred { CorrectionMode::Deferred } else { CorrectionMode::Dynamic };
            let state = match theta {
                Some(theta) => TeleportState::Bloch {
                    theta: *theta,
                    phi: *phi,
                },
                None => TeleportState::One,
            };
            let config = TeleportConfig::default().with_state(state).with_mode(mode);
            print_report(&teleportation::run(backend, &config, shots)?);
        }
        Commands::Superdense { messages } => {
            let messages: Vec<&str> = if messages.is_empty() {
                ALL_MESSAGES.to_vec()
            } else {
                messages.iter().map(String::as_str).collect()
            };
            print_report(&superdense::run(backend, &messages, shots)?);
        }
        Commands::Bb84 { bits, eve, compare } => {
            let config = Bb84Config::default()
                .with_num_bits(*bits)
                .with_seed(opts.seed)
                .with_eve(*eve);
            if *compare {
                print_report(&bb84::compare(backend, &config)?);
            } else {
                print_report(&bb84::run(backend, &config)?);
            }
        }
        Commands::E91 { rounds } => {
            let config = E91Config::default().with_key_rounds(*rounds).with_seed(opts.seed);
            print_report(&e91::run(backend, &config, shots)?);
        }
        Commands::BitFlip {
            initial,
            error_qubit,
            no_error,
            sweep,
        } => run_repetition(backend, opts, CodeKind::BitFlip, *initial, *error_qubit, *no_error, *sweep)?,
        Commands::PhaseFlip {
            initial,
            error_qubit,
            no_error,
            sweep,
        } => run_repetition(backend, opts, CodeKind::PhaseFlip, *initial, *error_qubit, *no_error, *sweep)?,
        Commands::ShorCode { input, errors } => {
            let cases = parse_errors(errors, shor_code::default_cases)?;
            print_report(&shor_code::run(backend, logical_state(*input), &cases, shots)?);
        }
        Commands::Steane { input, errors } => {
            let cases = parse_errors(errors, steane::default_cases)?;
            print_report(&steane::run(backend, logical_state(*input), &cases, shots)?);
        }
        Commands::ListBackends | Commands::All => bail!("{:?} does not run on a single backend", command),
    }
    Ok(())
}

/// Every demo with its default options, in catalog order
pub fn run_all(backend: &dyn Backend, opts: &GlobalOpts) -> Result<Vec<Box<dyn DemoReport>>> {
    let shots = opts.shots;
    let seed = opts.seed;
    tracing::info!(backend = backend.name(), shots, "running every demo");

    let reports: Vec<Box<dyn DemoReport>> = vec![
        Box::new(deutsch::run(backend, &DeutschOracle::ALL, shots)?),
        Box::new(deutsch_jozsa::run(backend, &DeutschJozsaConfig::default(), shots)?),
        Box::new(bernstein_vazirani::run(backend, bernstein_vazirani::DEFAULT_SECRET, shots)?),
        Box::new(grover::run(backend, &GroverConfig::default(), shots)?),
        Box::new(qft::run(backend, &QftConfig::default(), shots)?),
        Box::new(qpe::run(backend, &QpeConfig::default(), shots)?),
        Box::new(shor::run(backend, &ShorConfig::default(), shots)?),
        Box::new(qaoa::run(backend, &QaoaConfig::default().with_seed(seed), shots)?),
        Box::new(vqe::run(backend, &VqeConfig::default().with_seed(seed), shots)?),
        Box::new(swap_test::run(
            backend,
            &swap_test::default_cases(),
            SwapTestVariant::Ancilla,
            shots,
        )?),
        Box::new(quantum_walk::run(backend, &WalkConfig::default(), shots)?),
        Box::new(amplitude_estimation::run(backend, &AeConfig::default(), shots)?),
        Box::new(quantum_counting::run(backend, &CountingConfig::default(), shots)?),
        Box::new(hhl::run(backend, &HhlConfig::default(), shots)?),
        Box::new(simon::run(backend, simon::DEFAULT_SECRET, shots)?),
        Box::new(teleportation::run(backend, &TeleportConfig::default(), shots)?),
        Box::new(superdense::run(backend, &ALL_MESSAGES, shots)?),
        Box::new(bb84::compare(backend, &Bb84Config::default().with_seed(seed))?),
        Box::new(e91::run(backend, &E91Config::default().with_seed(seed), shots)?),
        Box::new(repetition::run(backend, &RepetitionConfig::new(CodeKind::BitFlip), shots)?),
        Box::new(repetition::run(backend, &RepetitionConfig::new(CodeKind::PhaseFlip), shots)?),
        Box::new(shor_code::run(backend, LogicalState::Zero, &shor_code::default_cases(), shots)?),
        Box::new(steane::run(backend, LogicalState::Zero, &steane::default_cases(), shots)?),
    ];
    Ok(reports)
}

fn print_backends() -> Result<()> {
    let credentials = IbmCredentials::auto_load().context("loading IBM Quantum credentials")?;
    let backends = list_backends(credentials).context("listing IBM Quantum backends")?;
    println!("{}", backend_table(&backends));
    Ok(())
}

/// Render the device list
pub fn backend_table(backends: &[BackendInfo]) -> String {
    let mut output = format!("{:<24} {:>7} {:>7} {:>12} {:>10}\n", "Name", "Qubits", "Queue", "Status", "Family");
    output.push_str(&"-".repeat(64));
    for b in backends {
        let qubits = b.num_qubits.map(|n| n.to_string()).unwrap_or_else(|| "?".into());
        let queue = b.queue_length.map(|n| n.to_string()).unwrap_or_else(|| "?".into());
        let status = match (b.simulator, b.operational) {
            (true, _) => "simulator",
            (false, true) => "online",
            (false, false) => "offline",
        };
        let family = b
            .processor_type
            .as_ref()
            .and_then(|p| p.family.clone())
            .unwrap_or_else(|| "-".into());
        output.push_str(&format!(
            "\n{:<24} {:>7} {:>7} {:>12} {:>10}",
            b.name, qubits, queue, status, family
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn opts(shots: u64) -> GlobalOpts {
        GlobalOpts {
            backend: Some(BackendKind::Simulator),
            ibm_backend: None,
            shots,
            seed: 42,
            verbose: false,
        }
    }

    #[test]
    fn test_full_sweep_on_ideal_simulator() {
        let backend = backend::simulator(BackendKind::Simulator, 42);
        let reports = run_all(&backend, &opts(512)).unwrap();
        assert_eq!(reports.len(), 23);
        let rows: Vec<SummaryRow> = reports.iter().map(|r| SummaryRow::from_report(r.as_ref())).collect();
        let table = summary_table(&rows);
        assert!(table.starts_with("Summary: "), "{}", table);
        for title in ["Teleportation", "Steane", "Shor"] {
            assert!(rows.iter().any(|r| r.title.contains(title)), "{}", title);
        }
    }

    #[test]
    fn test_commands_run_on_simulator() {
        for args in [
            vec!["qdemo", "--backend", "simulator", "--shots", "64", "deutsch", "--oracle", "balanced_identity"],
            vec!["qdemo", "--backend", "simulator", "--shots", "64", "deutsch-jozsa", "--constant", "1"],
            vec!["qdemo", "--backend", "simulator", "--shots", "64", "bit-flip", "--sweep"],
            vec!["qdemo", "--backend", "simulator", "--shots", "64", "steane", "--errors", "none", "Y3"],
            vec!["qdemo", "--backend", "noisy", "--shots", "64", "teleportation", "--deferred"],
        ] {
            let cli = Cli::parse_from(&args);
            execute(&cli).unwrap_or_else(|e| panic!("{:?}: {:#}", args, e));
        }
    }

    #[test]
    fn test_bad_options_are_reported() {
        let cli = Cli::parse_from(["qdemo", "--backend", "simulator", "bit-flip", "--initial", "2"]);
        assert!(execute(&cli).is_err());
        let cli = Cli::parse_from(["qdemo", "--backend", "simulator", "shor-code", "--errors", "W1"]);
        let err = execute(&cli).unwrap_err();
        assert!(format!("{:#}", err).contains("W1"));
    }

    #[test]
    fn test_backend_table() {
        let backends = vec![BackendInfo {
            name: "ibm_torino".into(),
            num_qubits: Some(133),
            simulator: false,
            operational: true,
            queue_length: Some(12),
            processor_type: None,
        }];
        let table = backend_table(&backends);
        assert!(table.contains("ibm_torino"));
        assert!(table.contains("133"));
        assert!(table.contains("online"));
    }
}

use picount::*;

/// Count primes with sub-linear combinatorial algorithms
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// x as a decimal integer or an expression like 10^15
    x: String,

    /// Algorithm to run
    #[arg(short, long, value_enum, default_value_t = Algo::Auto)]
    algo: Algo,

    /// Number of threads (default: all hardware threads)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Print per-formula progress to stderr
    #[arg(short, long, default_value_t = false)]
    status: bool,

    /// Compute the x-th prime instead of pi(x)
    #[arg(short, long, default_value_t = false)]
    nth_prime: bool,

    /// Report elapsed seconds
    #[arg(long, default_value_t = false)]
    time: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum Algo {
    /// Fastest available (Deleglise-Rivat)
    Auto,
    /// Legendre's formula, O(x) operations
    Legendre,
    /// Meissel's formula
    Meissel,
    /// Lehmer's formula
    Lehmer,
    /// Lagarias-Miller-Odlyzko
    Lmo,
    /// Deleglise-Rivat
    DelegliseRivat,
    /// Gourdon's variant (hard leaves via the A formula)
    Gourdon,
    /// Plain segmented sieve
    Primesieve,
}

fn main() {
    let cli = Args::parse();
    if let Some(threads) = cli.threads {
        set_num_threads(threads);
    }
    set_print_status(cli.status);

    let x = match expr::eval(&cli.x) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("picount: {e}");
            std::process::exit(1);
        }
    };

    let time = get_wtime();
    let threads = get_num_threads();
    let result: MaxInt = if cli.nth_prime {
        if x < 1 || x > i64::MAX as MaxInt {
            eprintln!("picount: nth_prime argument out of range");
            std::process::exit(1);
        }
        formula::nth_prime(x as i64, threads) as MaxInt
    } else {
        match cli.algo {
            Algo::Auto => formula::pi_deleglise_rivat(x, threads),
            Algo::Legendre => formula::pi_legendre(x, threads),
            Algo::Meissel => formula::pi_meissel(x, threads),
            Algo::Lehmer => formula::pi_lehmer(x, threads),
            Algo::Lmo => formula::pi_lmo(x, threads),
            Algo::DelegliseRivat => formula::pi_deleglise_rivat(x, threads),
            Algo::Gourdon => formula::pi_gourdon(x, threads),
            Algo::Primesieve => formula::pi_primesieve(x, threads),
        }
    };

    if cli.status {
        eprintln!();
    }
    println!("{result}");
    if cli.time {
        eprintln!("Seconds: {:.3}", get_wtime() - time);
    }
}

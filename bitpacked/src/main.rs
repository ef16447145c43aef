use clap::{Parser as ClapParser, Subcommand};
use std::process;

use bitpacked::{Identity, Mode, ModeCreateInfo, Object, ObjectType, Runtime, mode};

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Store every object on the heap
    #[arg(long, global = true, help = "Turn packing off, overriding BITPACKED")]
    conventional: bool,

    /// Report the sentinel count for packed values
    #[arg(long, global = true, help = "Do not simulate refcounts of packed values")]
    no_refcnt: bool,

    #[arg(long, global = true, help = "Ignore refcount errors instead of failing")]
    no_err_detect: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the configuration report and the mode word
    Config,
    /// Dump the tag to type table and the tag constants
    Table,
    /// Show the identity of each literal
    Id {
        #[arg(required = true, allow_hyphen_values = true, help = "e.g. 12000 -0.0 None 'spam' range(0,600,2)[:150:6]")]
        literals: Vec<String>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let mut info = match ModeCreateInfo::from_env() {
        Ok(info) => info,
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(2);
        }
    };
    if cli.conventional {
        info.packing = false;
    }
    if cli.no_refcnt {
        info.simulate_refcounts = false;
    }
    if cli.no_err_detect {
        info.error_detection = false;
    }

    let mode = match Mode::new(info).and_then(mode::install) {
        Ok(mode) => mode,
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(2);
        }
    };
    let runtime = Runtime::new(*mode);

    match cli.command.unwrap_or(Command::Config) {
        Command::Config => print_config(mode),
        Command::Table => print_table(&runtime),
        Command::Id { literals } => {
            if !print_identities(&runtime, &literals) {
                process::exit(1);
            }
        }
    }
}

fn print_config(mode: &Mode) {
    println!("{mode}");
    println!("Mode Word: {:032b}", mode.mode_word().bits());
}

fn print_table(runtime: &Runtime) {
    let Some(table) = runtime.type_table() else {
        println!("no type table, packing is off");
        return;
    };
    for (index, slot) in table.entries().iter().enumerate() {
        let name = slot.map_or("-", ObjectType::name);
        println!("{index:2}  0x{:02x}  {name}", index * 2);
    }
    println!();
    for tag in runtime.tag_constants() {
        println!("BITPACKED_TAG_{:<12} = 0x{:02x}", tag.name(), tag.bits());
    }
}

fn print_identities(runtime: &Runtime, literals: &[String]) -> bool {
    let mut ok = true;
    for literal in literals {
        let object = match literal.parse::<Object>() {
            Ok(object) => object,
            Err(err) => {
                eprintln!("Error: {err}");
                ok = false;
                continue;
            }
        };
        let word = runtime.identity_of(object);
        let tag = match word.identity() {
            Identity::Packed(tag) => tag.name(),
            Identity::Heap(_) => "heap",
            Identity::Invalid(_) => "invalid",
        };
        let ty = runtime.type_of(word).map_or("?", ObjectType::name);
        match runtime.refcount_of(word) {
            Ok(refcount) => println!("{literal:>24}  {word}  {tag:<10}  {ty:<18}  refcnt={refcount}"),
            Err(err) => println!("{literal:>24}  {word}  {tag:<10}  {ty:<18}  refcnt: {err}"),
        }
    }
    ok
}

// Copyright (c) 2018 Fabian Schuiki

use std::fs::File;
use std::path::Path;
use std::process;

use clap::{crate_authors, crate_description, crate_name, crate_version, App, Arg, ArgMatches};
use log::error;
use memmap::Mmap;
use thiserror::Error;

use parsetab::analysis::{LlAnalysis, LrAnalysis};
use parsetab::automaton::BuildError;
use parsetab::derivation::DerivationTree;
use parsetab::first::FirstSets;
use parsetab::follow::FollowSets;
use parsetab::grammar::Grammar;
use parsetab::parser::ParseError;
use parsetab::reader::{read_grammar, ReadError};
use parsetab::table::{Method, UnknownMethod};
use parsetab::tokens::{tokenize, TokenizeError};

#[derive(Debug, Error)]
enum ToolError {
    #[error("cannot read `{path}`: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("`{0}` is not valid UTF-8")]
    Utf8(String),
    #[error("{0}")]
    Read(#[from] ReadError),
    #[error("{0}")]
    Method(#[from] UnknownMethod),
    #[error("{0}")]
    Build(#[from] BuildError),
    #[error("{0}")]
    Tokenize(#[from] TokenizeError),
}

fn main() {
    let matches = App::new(crate_name!())
        .version(crate_version!())
        .author(crate_authors!())
        .about(crate_description!())
        .arg(
            Arg::with_name("GRAMMAR")
                .help("The grammar description to analyze")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("method")
                .short("m")
                .long("method")
                .help("The table construction method")
                .takes_value(true)
                .possible_values(&["lr0", "slr1", "lr1", "lalr1", "ll1"])
                .default_value("lalr1"),
        )
        .arg(Arg::with_name("first").long("first").help("Print the first sets"))
        .arg(Arg::with_name("follow").long("follow").help("Print the follow sets"))
        .arg(Arg::with_name("states").long("states").help("Print the automaton"))
        .arg(Arg::with_name("table").long("table").help("Print the parsing table"))
        .arg(
            Arg::with_name("parse")
                .short("p")
                .long("parse")
                .help("Whitespace separated terminals to parse")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbosity")
                .short("v")
                .multiple(true)
                .help("Increase message verbosity"),
        )
        .arg(
            Arg::with_name("quiet")
                .short("q")
                .help("Silence all output"),
        )
        .get_matches();

    stderrlog::new()
        .module(module_path!())
        .quiet(matches.is_present("quiet"))
        .verbosity(matches.occurrences_of("verbosity") as usize)
        .init()
        .ok();

    match run(&matches) {
        Ok(true) => (),
        Ok(false) => process::exit(1),
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }
}

/// Load the grammar file.
fn load(path: &Path) -> Result<Grammar, ToolError> {
    let io_error = |source| ToolError::Io {
        path: path.display().to_string(),
        source: source,
    };
    let file = File::open(path).map_err(io_error)?;
    if file.metadata().map_err(io_error)?.len() == 0 {
        return Ok(read_grammar("")?);
    }
    // SAFETY: the map is read only and dropped before `load` returns. The
    // grammar file must not be truncated by another process meanwhile.
    let mmap = unsafe { Mmap::map(&file) }.map_err(io_error)?;
    let text = std::str::from_utf8(&mmap)
        .map_err(|_| ToolError::Utf8(path.display().to_string()))?;
    Ok(read_grammar(text)?)
}

/// Perform the analysis requested on the command line. Returns whether the
/// grammar is free of conflicts and the input, if any, parsed.
fn run(matches: &ArgMatches) -> Result<bool, ToolError> {
    let path = Path::new(matches.value_of("GRAMMAR").unwrap_or_default());
    let grammar = load(path)?;
    match matches.value_of("method").unwrap_or("lalr1") {
        "ll1" => run_ll(matches, &grammar),
        name => {
            let method: Method = name.parse()?;
            run_lr(matches, &grammar, method)
        }
    }
}

fn print_sets(matches: &ArgMatches, grammar: &Grammar, first: &FirstSets, follow: &FollowSets) {
    if matches.is_present("first") {
        println!("first sets:");
        for nt in grammar.nonterminals() {
            let mut names: Vec<String> = first[nt]
                .symbols()
                .map(|t| t.pretty(grammar).to_string())
                .collect();
            if first[nt].has_epsilon() {
                names.push("ε".into());
            }
            println!("    {}: {}", nt.pretty(grammar), names.join(" "));
        }
    }
    if matches.is_present("follow") {
        println!("follow sets:");
        for nt in grammar.nonterminals() {
            let names: Vec<String> = follow
                .terminals(nt)
                .map(|t| t.pretty(grammar).to_string())
                .collect();
            println!("    {}: {}", nt.pretty(grammar), names.join(" "));
        }
    }
}

fn run_lr(matches: &ArgMatches, grammar: &Grammar, method: Method) -> Result<bool, ToolError> {
    let analysis = LrAnalysis::compute(grammar, method)?;
    let grammar = analysis.grammar();
    print_sets(matches, grammar, analysis.first_sets(), analysis.follow_sets());
    if matches.is_present("states") {
        println!("{}", analysis.automaton().pretty(grammar));
    }
    if matches.is_present("table") {
        println!("{} table:", method);
        println!("{}", analysis.table().pretty(grammar));
    }

    let mut ok = true;
    let conflicts = analysis.table().conflicts();
    for (conflict, witness) in conflicts.iter().zip(analysis.witnesses()) {
        ok = false;
        println!("{}", conflict.pretty(grammar));
        match witness {
            Ok(w) => println!("  example: {}", w.pretty(grammar)),
            Err(e) => println!("  no example: {}", e),
        }
    }
    if conflicts.is_empty() {
        println!("grammar is {}", method);
    }

    if let Some(input) = matches.value_of("parse") {
        let tokens = tokenize(grammar, input)?;
        match analysis.parser().parse(&tokens) {
            Ok(parse) => {
                for &rule in &parse.reductions {
                    println!("{}", rule.pretty(grammar));
                }
                print_tree(grammar, parse.tree(grammar));
            }
            Err(e) => {
                report_parse_error(e);
                ok = false;
            }
        }
    }
    Ok(ok)
}

fn run_ll(matches: &ArgMatches, grammar: &Grammar) -> Result<bool, ToolError> {
    let analysis = LlAnalysis::compute(grammar);
    print_sets(matches, grammar, analysis.first_sets(), analysis.follow_sets());
    if matches.is_present("table") {
        println!("LL(1) table:");
        println!("{}", analysis.table().pretty(grammar));
    }

    let mut ok = true;
    for conflict in analysis.table().conflicts() {
        ok = false;
        println!("{}", conflict.pretty(grammar));
        match analysis.witness(conflict) {
            Ok(w) => println!("  example {}", w.pretty(grammar)),
            Err(e) => println!("  no example: {}", e),
        }
    }
    if ok {
        println!("grammar is LL(1)");
    }

    if let Some(input) = matches.value_of("parse") {
        let tokens = tokenize(grammar, input)?;
        match analysis.parser().parse(&tokens) {
            Ok(rules) => {
                for &rule in &rules {
                    println!("{}", rule.pretty(grammar));
                }
                print_tree(grammar, DerivationTree::from_left_parse(grammar, &rules));
            }
            Err(e) => {
                report_parse_error(e);
                ok = false;
            }
        }
    }
    Ok(ok)
}

fn print_tree<E: std::fmt::Display>(grammar: &Grammar, tree: Result<DerivationTree, E>) {
    match tree {
        Ok(tree) => println!("{}", tree.pretty(grammar)),
        Err(e) => error!("{}", e),
    }
}

fn report_parse_error(e: ParseError) {
    match e {
        ParseError::CorruptTable { .. } => error!("{}", e),
        _ => println!("syntax error: {}", e),
    }
}

//! Interactive session and file runner.
//!
//! With no arguments: a line-edited prompt loop evaluating each line in a
//! persistent global environment. With filename arguments: each file is
//! run through the `load` builtin in order. The process exits successfully
//! either way; failures are printed, not propagated.

use qlisp::ast::Value;
use qlisp::builtins::create_global_env;
use qlisp::env::EnvRef;
use qlisp::evaluator;
use qlisp::parser::parse_program;
use qlisp::reader;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

fn main() {
    let env = create_global_env();
    let files: Vec<String> = std::env::args().skip(1).collect();

    if files.is_empty() {
        run_repl(&env);
    } else {
        run_files(&env, &files);
    }
}

fn run_files(env: &EnvRef, files: &[String]) {
    let Some(load) = env.get("load") else {
        // load is in the builtin registry, so this cannot happen
        return;
    };
    for file in files {
        let result = evaluator::call(env, load.clone(), vec![Value::Str(file.clone())]);
        if result.is_error() {
            println!("{result}");
        }
    }
}

fn run_repl(env: &EnvRef) {
    println!("qlisp {}", env!("CARGO_PKG_VERSION"));
    println!("Enter expressions like: (+ 1 2)");
    println!("Press Ctrl+C or Ctrl+D to exit.");
    println!();

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("could not initialize line editor: {e}");
            return;
        }
    };

    loop {
        match rl.readline("qlisp> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                match parse_program(line) {
                    Ok(root) => {
                        let result = evaluator::eval(env, reader::read(&root));
                        println!("{result}");
                    }
                    Err(e) => println!("Parse error: {e}"),
                }
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(e) => {
                println!("Error: {e:?}");
                break;
            }
        }
    }
}

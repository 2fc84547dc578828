//! Walks through mounting, event dispatch and keyed updates against the in-memory
//! document, printing the HTML after every step.

mod components;

use anyhow::Context;
use rivulet::{logging, prelude::*};

use crate::components::{HelloMessage, TodoList};

const GREETING: &str = "greeting";
const TODOS: &str = "todos";

fn main() -> anyhow::Result<()> {
    logging::install_tracing();

    let document = Document::builder()
        .with_container(GREETING)
        .with_container(TODOS)
        .build();
    let mut engine = Engine::new(document);

    let greeting = engine.render(component::<HelloMessage>().prop("name", "Rivulet"), GREETING)?;
    print_container(&engine, GREETING)?;
    for _ in 0..2 {
        engine.dispatch(&Event::new("click", greeting.clone()))?;
        print_container(&engine, GREETING)?;
    }

    let todos = engine.render(component::<TodoList>(), TODOS)?;
    let input = todos.child_index(0);
    let button = todos.child_index(1);
    for item in ["milk", "eggs"] {
        engine.dispatch(&Event::new("keyup", input.clone()).with_value(item))?;
        engine.dispatch(&Event::new("click", button.clone()))?;
    }
    print_container(&engine, TODOS)?;

    let snapshot = serde_json::to_string_pretty(&engine.renderer().container(TODOS))
        .context("serializing the todo list")?;
    println!("{snapshot}");
    Ok(())
}

fn print_container(engine: &Engine<Document>, container: &str) -> anyhow::Result<()> {
    let html = engine
        .renderer()
        .to_html(container)
        .with_context(|| format!("container `{container}` is not part of the document"))?;
    println!("{container}: {html}");
    Ok(())
}

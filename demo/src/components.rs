//! Components used by the walkthrough.

use rivulet::prelude::*;

/// Greets `name`, toggling between "say" and "shout" on click.
pub struct HelloMessage;

impl Component for HelloMessage {
    fn create(_props: &Props) -> Self {
        Self
    }

    fn initial_state(&self, _props: &Props) -> State {
        props! { "type" => "say" }
    }

    fn lifecycle() -> Lifecycle<Self> {
        Lifecycle::new()
            .render(Self::render)
            .before_mount(|_, _| tracing::info!("HelloMessage: before mount"))
            .after_mount(|_, _| tracing::info!("HelloMessage: after mount"))
            .after_update(|_, scope, _, prev| {
                tracing::info!(
                    from = %prev.get("type").cloned().unwrap_or_default(),
                    to = %scope.state().get("type").cloned().unwrap_or_default(),
                    "HelloMessage: after update"
                );
            })
    }
}

impl HelloMessage {
    fn render(&self, scope: &Scope<'_>) -> Descriptor {
        let kind = scope
            .state()
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("say")
            .to_owned();
        let name = scope.props().get("name").and_then(Value::as_str).unwrap_or("stranger");
        let onclick = scope.handler(move |updater, _| {
            let next = if kind == "say" { "shout" } else { "say" };
            updater.set_state(props! { "type" => next });
        });
        el!("div" { "onclick" => onclick } [
            text(scope.state().get("type").and_then(Value::as_str).unwrap_or("say")),
            text("Hello "),
            text(name),
        ])
        .into()
    }
}

/// A text input, an add button and the list of added items.
pub struct TodoList;

impl Component for TodoList {
    fn create(_props: &Props) -> Self {
        Self
    }

    fn initial_state(&self, _props: &Props) -> State {
        props! { "items" => Vec::<Value>::new(), "text" => "" }
    }

    fn lifecycle() -> Lifecycle<Self> {
        Lifecycle::new().render(Self::render)
    }
}

impl TodoList {
    fn render(&self, scope: &Scope<'_>) -> Descriptor {
        let items = scope.state().get("items").and_then(Value::as_list).unwrap_or_default();

        let onkeyup = scope.handler(|updater, event| {
            updater.set_state(props! { "text" => event.value().unwrap_or_default() });
        });
        let onclick = scope.handler(|updater, _| {
            updater.update_state(|state| {
                let mut items = state
                    .get("items")
                    .and_then(Value::as_list)
                    .map(<[Value]>::to_vec)
                    .unwrap_or_default();
                items.push(state.get("text").cloned().unwrap_or_default());
                props! { "items" => items, "text" => "" }
            });
        });

        let input = el!("input" { "type" => "text", "onkeyup" => onkeyup });
        let button = el!("button" { "onclick" => onclick } [
            text("Add#"),
            text(items.len() + 1),
        ]);
        let rows = items
            .iter()
            .enumerate()
            .map(|(index, item)| element("p").key(format!("item-{index}")).child(text(item)));

        element("div").child(input).child(button).children(rows).into()
    }
}

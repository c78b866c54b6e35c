use treeflags::{ActionError, App, Command, Context, Flag};

fn hello(ctx: &Context<'_>) -> Result<(), ActionError> {
    let (name, _) = ctx.string("name");
    let (times, _) = ctx.int("times");
    let (emoji, _) = ctx.bool("emoji");
    let bang = if emoji { "❣️" } else { "!" };
    for _ in 0..times {
        println!("Hello {name}{bang}");
    }
    Ok(())
}

fn shout(ctx: &Context<'_>) -> Result<(), ActionError> {
    let (name, _) = ctx.string("name");
    let words = ctx.positionals().join(" ");
    println!("{} {}!", words.to_uppercase(), name.to_uppercase());
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("HELLO_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let app = App::new("hello")
        .description("Greets people, politely or not.")
        .action(hello)
        .flag(
            Flag::string("name", "world")
                .short('n')
                .metavar("NAME")
                .env("HELLO_NAME")
                .usage("Who to greet."),
        )
        .flag(Flag::int_in("times", 1, 1..=10).short('t').metavar("N").usage("How often."))
        .flag(Flag::bool("emoji", false).short('e').usage("Use a fancier bang."))
        .command(
            Command::new("shout")
                .usage("Greet loudly")
                .description("Repeats the positional words in capitals, then the name.")
                .inherit_parent_flags()
                .action(shout),
        );

    app.run_or_exit();
}

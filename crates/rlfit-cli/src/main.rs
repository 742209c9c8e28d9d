mod command;
mod config;
mod table;
mod util;

fn main() -> anyhow::Result<()> {
    command::run()
}

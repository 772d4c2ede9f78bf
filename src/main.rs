fn main() -> anyhow::Result<()> {
    kleczewsky_world::start()
}

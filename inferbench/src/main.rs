fn main() -> anyhow::Result<()> {
    inferbench::run()
}

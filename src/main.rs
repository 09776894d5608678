fn main() {
    medchart_lib::run()
}

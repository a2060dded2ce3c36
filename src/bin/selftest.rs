//! Checks whether the system has a findable GPU adapter, the way the
//! raytracer's `gpu_handles::self_test` does for its own windowed app.

fn main() {
    env_logger::init();
    if lbvh_gpu::gpu::self_test() {
        std::process::exit(0);
    } else {
        std::process::exit(1);
    }
}

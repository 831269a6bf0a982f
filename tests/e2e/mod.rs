// End-to-end tests for the batch TTS API
//
// Each test starts the real router on an ephemeral port. The Volcano Engine
// repository is replaced by an in-process fake that records every call and
// the highest number of calls it saw in flight at once, so limiter behaviour
// can be asserted through HTTP.

mod helpers;
mod test_health;
mod test_limiters;

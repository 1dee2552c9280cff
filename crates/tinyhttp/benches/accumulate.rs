use std::convert::Infallible;

use bytes::Bytes;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use futures_util::{StreamExt, stream};
use tinyhttp::{BoxError, Client, ClientOptions, HeaderMap, OutgoingRequest, RawResponse, RequestOptions, Transport};

// Serves the same body, split into fixed-size chunks, for every request
struct ChunkedTransport {
    chunk_size: usize,
    num_chunks: usize,
}

impl Transport for ChunkedTransport {
    type Error = Infallible;

    async fn send(&self, _request: OutgoingRequest) -> Result<RawResponse, Self::Error> {
        let chunk = Bytes::from(vec![0u8; self.chunk_size]);
        let chunks = stream::iter((0..self.num_chunks).map(move |_| Ok::<_, BoxError>(chunk.clone())));
        Ok(RawResponse {
            status: Some(200),
            status_message: "OK".to_string(),
            headers: HeaderMap::new(),
            body: Box::pin(chunks),
        })
    }
}

fn bench_buffered(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffered_body");
    let rt = tokio::runtime::Runtime::new().unwrap();

    for chunk_size in [1024usize, 16 * 1024, 64 * 1024] {
        let total_bytes = 4 * 1024 * 1024;
        let num_chunks = total_bytes / chunk_size;
        let client = Client::new(ClientOptions::new("http://bench.test"), ChunkedTransport { chunk_size, num_chunks });

        group.throughput(Throughput::Bytes(total_bytes as u64));
        group.bench_with_input(BenchmarkId::new("chunk_size", chunk_size), &chunk_size, |b, _| {
            b.iter(|| {
                rt.block_on(async {
                    let response = client.get("/body", RequestOptions::default()).await.unwrap();
                    black_box(response.data().len())
                })
            });
        });
    }

    group.finish();
}

fn bench_streaming(c: &mut Criterion) {
    let mut group = c.benchmark_group("streaming_body");
    let rt = tokio::runtime::Runtime::new().unwrap();

    for chunk_size in [1024usize, 64 * 1024] {
        let total_bytes = 4 * 1024 * 1024;
        let num_chunks = total_bytes / chunk_size;
        let client = Client::new(ClientOptions::new("http://bench.test"), ChunkedTransport { chunk_size, num_chunks });

        group.throughput(Throughput::Bytes(total_bytes as u64));
        group.bench_with_input(BenchmarkId::new("live_stream", chunk_size), &chunk_size, |b, _| {
            b.iter(|| {
                rt.block_on(async {
                    let options = RequestOptions::default().stream(true);
                    let mut response = client.get("/body", options).await.unwrap();
                    let mut live = response.take_stream().unwrap();

                    let mut total_processed = 0;
                    while let Some(chunk) = live.next().await {
                        total_processed += black_box(chunk.unwrap().len());
                    }
                    total_processed
                })
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_buffered, bench_streaming);
criterion_main!(benches);

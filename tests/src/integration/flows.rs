//! # Integration Test Flows
//!
//! Several nodes, each with its own pool, store and handler, run the full
//! block lifecycle against one another:
//!
//! 1. **Gossip**: every node receives the same transactions
//! 2. **Proposal**: every node assembles and seals a candidate on the shared tip
//! 3. **Fork choice**: every node ranks the candidates and must agree
//! 4. **Confirmation**: the winner travels over the wire, is dry-run, stored
//!    and executed everywhere, leaving every pool empty

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use luckyblock::adapters::{InMemoryBlockStore, InMemoryEventBus};
    use luckyblock::test_utils::{test_message, TestHandler};
    use luckyblock::{
        select_winner, Block, BlockGenerator, BlockGeneratorApi, HandlerRegistry,
        LuckyBlockConfig, LuckyBlockError,
    };
    use rand::seq::SliceRandom;

    type Generator = BlockGenerator<InMemoryBlockStore, InMemoryEventBus>;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Node {
        generator: Generator,
        handler: Arc<TestHandler>,
        events: Arc<InMemoryEventBus>,
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn node(peer_id: &str, store: InMemoryBlockStore) -> Node {
        let handler = Arc::new(TestHandler::new("exchange"));
        let events = Arc::new(InMemoryEventBus::new());
        let generator = BlockGenerator::new(
            LuckyBlockConfig::for_peer(peer_id),
            HandlerRegistry::new().with(handler.clone()),
            Arc::new(store),
            events.clone(),
        );
        Node {
            generator,
            handler,
            events,
        }
    }

    fn network(peers: &[&str]) -> Vec<Node> {
        peers
            .iter()
            .map(|p| node(p, InMemoryBlockStore::new()))
            .collect()
    }

    async fn gossip(nodes: &[Node], hashes: &[&str]) {
        for n in nodes {
            for h in hashes {
                assert!(n
                    .generator
                    .receive_transaction(&test_message("exchange", h))
                    .await
                    .is_some());
            }
        }
    }

    async fn bootstrap(nodes: &[Node]) -> Block {
        let genesis = nodes[0].generator.generate_genesis_block().unwrap();
        for n in nodes {
            n.generator.confirm_block(&genesis).await.unwrap();
        }
        genesis
    }

    fn propose(nodes: &[Node], branch: &[Block]) -> Vec<Block> {
        nodes
            .iter()
            .map(|n| n.generator.generate_block(branch).unwrap().seal().unwrap())
            .collect()
    }

    // =============================================================================
    // INTEGRATION TESTS: FULL ROUND
    // =============================================================================

    #[tokio::test]
    async fn test_nodes_agree_on_winner_and_confirm_it() {
        init_tracing();
        let nodes = network(&["QmPeerA", "QmPeerB", "QmPeerC", "QmPeerD"]);
        let genesis = bootstrap(&nodes).await;
        gossip(&nodes, &["tx-3", "tx-1", "tx-2"]).await;

        let candidates = propose(&nodes, &[genesis.clone()]);
        for c in &candidates {
            assert!(c.valid());
            assert_eq!(c.parent_hash(), genesis.hash());
            assert_eq!(c.transaction_hashes(), &["tx-1", "tx-2", "tx-3"]);
        }

        // Each node sees the candidates in its own arrival order
        let mut rng = rand::thread_rng();
        let mut winners = Vec::new();
        for _ in &nodes {
            let mut seen = candidates.clone();
            seen.shuffle(&mut rng);
            winners.push(select_winner(&seen).unwrap().hash().to_string());
        }
        assert!(winners.windows(2).all(|w| w[0] == w[1]));

        let winner = candidates
            .iter()
            .find(|c| c.hash() == winners[0])
            .unwrap()
            .clone();
        let max_score = candidates.iter().map(|c| c.score()).max().unwrap();
        assert_eq!(winner.score(), max_score);

        for n in &nodes {
            assert!(n.generator.try_commit_block(&winner, &[genesis.clone()]).await);
            n.generator.confirm_block(&winner).await.unwrap();
        }

        for n in &nodes {
            assert!(n.generator.pool().is_empty());
            assert_eq!(n.handler.executed(), vec!["tx-1", "tx-2", "tx-3"]);
            // Genesis plus the winner
            assert_eq!(n.events.confirmation_count(), 2);
        }
    }

    #[tokio::test]
    async fn test_wire_block_confirmed_on_remote_node() {
        init_tracing();
        let nodes = network(&["QmPeerA", "QmPeerB"]);
        let genesis = bootstrap(&nodes).await;
        gossip(&nodes, &["tx-1", "tx-2"]).await;

        let proposer = &nodes[0];
        let remote = &nodes[1];

        let block = proposer
            .generator
            .generate_block(&[genesis.clone()])
            .unwrap()
            .seal()
            .unwrap();
        let (data, links) = block.marshal().unwrap();

        let decoded = remote
            .generator
            .block_prototype()
            .unwrap()
            .unmarshal(&data, &links)
            .unwrap();
        assert_eq!(decoded.hash(), block.hash());
        assert!(decoded.valid());
        assert!(!decoded.has_bodies());

        remote.generator.confirm_block(&decoded).await.unwrap();
        assert_eq!(remote.handler.executed(), vec!["tx-1", "tx-2"]);
        assert!(remote.generator.pool().is_empty());
        // Proposer has not confirmed yet
        assert_eq!(proposer.generator.pool().len(), 2);
    }

    #[tokio::test]
    async fn test_later_transactions_build_on_confirmed_branch() {
        let nodes = network(&["QmPeerA"]);
        let n = &nodes[0];
        let genesis = bootstrap(&nodes).await;

        gossip(&nodes, &["tx-1"]).await;
        let b1 = n
            .generator
            .generate_block(&[genesis.clone()])
            .unwrap()
            .seal()
            .unwrap();

        // b1 is not confirmed yet, but the branch already carries tx-1
        gossip(&nodes, &["tx-2"]).await;
        let b2 = n
            .generator
            .generate_block(&[b1.clone(), genesis.clone()])
            .unwrap()
            .seal()
            .unwrap();

        assert_eq!(b2.transaction_hashes(), &["tx-2"]);
        assert_eq!(b2.block_number(), 2);
        assert!(n.generator.try_commit_block(&b2, &[b1.clone()]).await);
        assert!(!n.generator.try_commit_block(&b2, &[]).await);

        n.generator.confirm_block(&b1).await.unwrap();
        n.generator.confirm_block(&b2).await.unwrap();
        assert_eq!(n.handler.executed(), vec!["tx-1", "tx-2"]);
    }

    #[tokio::test]
    async fn test_failed_execution_keeps_transactions_for_next_round() {
        let nodes = network(&["QmPeerA"]);
        let n = &nodes[0];
        let genesis = bootstrap(&nodes).await;
        gossip(&nodes, &["tx-1", "tx-2"]).await;
        n.handler.fail_on("tx-2");

        let block = n
            .generator
            .generate_block(&[genesis])
            .unwrap()
            .seal()
            .unwrap();
        let err = n.generator.confirm_block(&block).await.unwrap_err();

        assert!(matches!(err, LuckyBlockError::ExecutionFailure { .. }));
        assert_eq!(n.generator.pool().len(), 2);
        assert_eq!(n.events.confirmation_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_transactions_never_reach_pool() {
        let nodes = network(&["QmPeerA"]);
        let n = &nodes[0];

        assert!(n
            .generator
            .receive_transaction(&test_message("mint", "tx-1"))
            .await
            .is_none());
        assert!(n.generator.pool().is_empty());
        assert_eq!(n.events.event_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_times_out_without_side_effects() {
        let slow = InMemoryBlockStore::new().with_submit_delay(Duration::from_secs(4));
        let n = node("QmPeerA", slow.clone());
        let genesis = n.generator.generate_genesis_block().unwrap();

        let err = n.generator.confirm_block(&genesis).await.unwrap_err();
        assert!(matches!(err, LuckyBlockError::Timeout { .. }));
        assert!(err.is_recoverable());
        assert!(slow.is_empty());
        assert_eq!(n.events.confirmation_count(), 0);
    }
}
